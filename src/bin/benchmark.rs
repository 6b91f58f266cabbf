use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 20;
const CONTENDERS: usize = 20;
const CONTENDED_SLOTS: usize = 10;

struct Target {
    name: &'static str,
    url: String,
}

struct Session {
    client: Client,
    csrf_token: String,
}

#[tokio::main]
async fn main() {
    let base_url = env::var("BENCH_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let admin_email = env::var("BENCH_ADMIN_EMAIL").expect("BENCH_ADMIN_EMAIL must match the server's ADMIN_EMAIL");
    let admin_password = env::var("BENCH_ADMIN_PASSWORD").expect("BENCH_ADMIN_PASSWORD must match the server's ADMIN_PASSWORD");

    println!("{}", "🚀 Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", base_url);

    let probe = new_client();
    if probe.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("❌ Server is NOT reachable at {}. Please start it first.", base_url).red().bold());
        return;
    }

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let admin = login(&base_url, &admin_email, &admin_password).await;

    let run_id = Uuid::new_v4().simple().to_string();
    let master_email = format!("bench-master-{}@example.com", run_id);
    let master_password = "bench-password";
    let master_id = post_json(&admin, &format!("{}/api/v1/users/masters", base_url), json!({
        "email": master_email,
        "password": master_password,
        "name": "Benchmark Master"
    })).await["id"].as_str().expect("No master id").to_string();

    let service_id = post_json(&admin, &format!("{}/api/v1/services", base_url), json!({
        "name": format!("Benchmark Service {}", run_id),
        "description": "Load testing",
        "price": 1000,
        "duration": 60
    })).await["id"].as_str().expect("No service id").to_string();

    let master = login(&base_url, &master_email, master_password).await;
    let first_day = (Utc::now() + ChronoDuration::days(2)).date_naive();
    let slots = post_json(&master, &format!("{}/api/v1/slots", base_url), json!({
        "date": first_day.format("%Y-%m-%d").to_string(),
        "until": (first_day + ChronoDuration::days(2)).format("%Y-%m-%d").to_string(),
        "start_time": "08:00",
        "end_time": "20:00",
        "duration": 60
    })).await;
    let slot_ids: Vec<String> = slots["slot_ids"].as_array().expect("No slot ids")
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    println!("{}", "✅ Data created successfully.".green());
    println!("   Master ID:  {}", master_id);
    println!("   Service ID: {}", service_id);
    println!("   Slots:      {}", slot_ids.len());

    let targets = vec![
        Target { name: "Health Check (Public)", url: format!("{}/health", base_url) },
        Target { name: "List Services (Public Read)", url: format!("{}/api/v1/services", base_url) },
        Target { name: "Master Schedule (Public Read)", url: format!("{}/api/v1/slots/master/{}", base_url, master_id) },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        print_header(target.name, &target.url);
        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&probe, &target, rps).await;
        }
    }

    print_header("Slot Contention (Booking Create)", &format!("{}/api/v1/bookings", base_url));
    let mut clients = Vec::with_capacity(CONTENDERS);
    for i in 0..CONTENDERS {
        clients.push(register_client(&base_url, &run_id, i).await);
    }
    let clients = Arc::new(clients);

    println!("{:<38} | {:<8} | {:<8} | {:<8} | {:<10}", "Slot", "201", "409", "Other", "P99 (ms)");
    println!("{:-<38}-+-{:-<8}-+-{:-<8}-+-{:-<8}-+-{:-<10}", "", "", "", "", "");

    let mut violations = 0;
    for slot_id in slot_ids.iter().take(CONTENDED_SLOTS) {
        let won = run_contention(&base_url, clients.clone(), &master_id, &service_id, slot_id).await;
        if won != 1 {
            violations += 1;
        }
    }

    if violations == 0 {
        println!("\n{}", "✅ Every contended slot was booked exactly once.".green().bold());
    } else {
        println!("\n{}", format!("❌ {} slot(s) did not end with exactly one booking.", violations).red().bold());
    }
}

fn new_client() -> Client {
    Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .cookie_store(true)
        .build()
        .expect("Failed to build HTTP client")
}

fn print_header(name: &str, url: &str) {
    println!("\n{}", "=".repeat(60));
    println!("Benchmarking Endpoint: {}", name.cyan().bold());
    println!("URL: {}", url);
    println!("{}", "=".repeat(60));
}

async fn login(base_url: &str, email: &str, password: &str) -> Session {
    let client = new_client();
    let res = client.post(format!("{}/api/v1/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login request failed");

    if !res.status().is_success() {
        panic!("Login failed for {}. Status: {}", email, res.status());
    }

    let body: Value = res.json().await.expect("Failed to parse login response");
    let csrf_token = body["csrf_token"].as_str().expect("No csrf_token").to_string();
    Session { client, csrf_token }
}

async fn register_client(base_url: &str, run_id: &str, index: usize) -> Session {
    let client = new_client();
    let res = client.post(format!("{}/api/v1/auth/register", base_url))
        .json(&json!({
            "email": format!("bench-client-{}-{}@example.com", run_id, index),
            "password": "bench-password",
            "name": format!("Benchmark Client {}", index)
        }))
        .send()
        .await
        .expect("Register request failed");

    if !res.status().is_success() {
        panic!("Register failed. Status: {}", res.status());
    }

    let body: Value = res.json().await.expect("Failed to parse register response");
    let csrf_token = body["csrf_token"].as_str().expect("No csrf_token").to_string();
    Session { client, csrf_token }
}

async fn post_json(session: &Session, url: &str, body: Value) -> Value {
    let res = session.client.post(url)
        .header("X-CSRF-Token", &session.csrf_token)
        .json(&body)
        .send()
        .await
        .expect("Setup request failed");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Setup request to {} failed. Status: {}. Body: {}", url, status, txt);
    }

    res.json().await.expect("Failed to parse setup response")
}

/// Fires one booking request per client at the same slot simultaneously and
/// returns how many succeeded.
async fn run_contention(base_url: &str, clients: Arc<Vec<Session>>, master_id: &str, service_id: &str, slot_id: &str) -> usize {
    let body = json!({ "master_id": master_id, "service_id": service_id, "slot_id": slot_id });
    let url = format!("{}/api/v1/bookings", base_url);
    let (tx, mut rx) = mpsc::channel(clients.len());

    for i in 0..clients.len() {
        let clients = clients.clone();
        let url = url.clone();
        let body = body.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let session = &clients[i];
            let req_start = Instant::now();
            let res = session.client.post(&url)
                .header("X-CSRF-Token", &session.csrf_token)
                .json(&body)
                .send()
                .await;
            let status = res.map(|r| r.status()).ok();
            let _ = tx.send((req_start.elapsed(), status)).await;
        });
    }
    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).expect("Failed to create histogram");
    let (mut created, mut conflicts, mut other) = (0, 0, 0);

    while let Some((latency, status)) = rx.recv().await {
        let _ = histogram.record(latency.as_micros() as u64);
        match status {
            Some(StatusCode::CREATED) => created += 1,
            Some(StatusCode::CONFLICT) => conflicts += 1,
            _ => other += 1,
        }
    }

    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let created_col = if created == 1 { created.to_string().green() } else { created.to_string().red() };

    println!("{:<38} | {:<8} | {:<8} | {:<8} | {:<10.2}", slot_id, created_col, conflicts, other, p99_ms);
    created
}

async fn run_stage(client: &Client, target: &Target, rps: u32) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN))
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = client.get(&url).send().await;
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).expect("Failed to create histogram");
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        let _ = histogram.record(latency.as_micros() as u64);
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
}

#[tokio::main]
async fn main() {
    if let Err(e) = master_booking::run().await {
        eprintln!("master_booking failed to start: {}", e);
        std::process::exit(1);
    }
}

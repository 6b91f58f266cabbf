use serde::Serialize;

/// Body of successful mutations: the affected id and a human-readable message.
#[derive(Serialize)]
pub struct ActionResponse {
    pub id: String,
    pub message: String,
}

impl ActionResponse {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id: id.into(), message: message.into() }
    }
}

#[derive(Serialize)]
pub struct SlotsCreatedResponse {
    pub created: usize,
    pub slot_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct MarkedReadResponse {
    pub updated: u64,
}

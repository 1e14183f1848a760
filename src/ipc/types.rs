use serde::Deserialize;

use crate::snapshot::Snapshot;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub snapshot: Option<Snapshot>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState { snapshot: None }
    }
}

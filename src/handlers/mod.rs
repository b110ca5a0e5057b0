use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

pub mod redirect;
pub mod shorten;
pub mod stats;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "links": state.store.count().await,
    }))
}

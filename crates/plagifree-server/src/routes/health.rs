use axum::Json;
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "PlagiFree AI API" }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

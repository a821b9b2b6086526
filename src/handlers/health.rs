use axum::Json;
use serde_json::{Value, json};

/// Liveness endpoint, always OK regardless of dependency state.
pub async fn healthz() -> Json<Value> {
    Json(json!({"ok": true}))
}

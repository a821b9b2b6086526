use axum::extract::State;
use std::sync::Arc;

use crate::handlers::AppState;

pub const GREETING: &str = "Hello from my Dev standards repo 🔥";

/// Fallback for every path outside /healthz and /deps: the greeting plus a
/// summary of which dependencies are configured.
pub async fn home(State(state): State<Arc<AppState>>) -> String {
    format!(
        "{}\n\nredis configured: {}\nsql configured: {}\n\nendpoints: [\"/healthz\",\"/deps\"]\n",
        GREETING,
        state.deps.redis_configured(),
        state.deps.sql_configured(),
    )
}

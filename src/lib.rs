pub mod config;
pub mod handlers;
pub mod probes;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;

use handlers::AppState;

/// Builds the router; split out of main so tests can serve the real thing.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/deps", get(handlers::deps::deps))
        .fallback(handlers::home::home)
        .with_state(state)
}

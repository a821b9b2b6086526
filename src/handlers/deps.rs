use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use std::sync::Arc;

use crate::handlers::AppState;
use crate::probes::DependencyReport;

#[derive(Serialize)]
pub struct DepsResponse {
    pub ok: bool,
    pub redis: DependencyReport,
    pub sql: DependencyReport,
}

/// Probes both dependencies in parallel and reports their health.
/// 503 when any configured dependency is unhealthy.
pub async fn deps(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DepsResponse>) {
    let report = state.deps.check_all().await;

    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(DepsResponse {
            ok: report.ok,
            redis: DependencyReport::from(&report.redis),
            sql: DependencyReport::from(&report.sql),
        }),
    )
}

//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: String,
    build_version: &'static str,
    broker_connected: bool,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.api_version.to_string(),
        build_version: env!("CARGO_PKG_VERSION"),
        broker_connected: state.dispatcher.is_connected().await,
    })
}

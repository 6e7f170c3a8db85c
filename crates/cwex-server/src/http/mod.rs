//! HTTP surface of the cwex server.
//!
//! Every registry, auth and command route is mounted under
//! `/cwex/<version>`; `/health` sits outside the versioned prefix.

mod auth;
mod commands;
mod error;
mod extract;
mod health;
mod machines;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::CredentialVerifier;
use crate::dispatch::CommandDispatcher;
use crate::registry::MachineRegistry;

pub use error::ApiError;
pub use extract::{ApiJson, AuthUser};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: MachineRegistry,
    pub auth: Arc<CredentialVerifier>,
    pub dispatcher: Arc<CommandDispatcher>,
    /// Deployment version segment the routes are mounted under.
    pub api_version: Arc<str>,
}

/// Path prefix for a deployment version, e.g. `/cwex/v1`.
pub fn route_prefix(version: &str) -> String {
    format!("/cwex/{version}")
}

/// Build the full router with CORS, compression and request tracing.
pub fn build_router(state: AppState) -> Router {
    let prefix = route_prefix(&state.api_version);
    let api = Router::new()
        .route(
            "/machines",
            get(machines::list_machines).post(machines::add_machine),
        )
        .route(
            "/machines/{id}",
            get(machines::get_machine)
                .put(machines::update_machine)
                .delete(machines::delete_machine),
        )
        .route("/machines/{id}/blink", post(commands::blink_machine))
        .route("/auth", get(auth::load_user).post(auth::login));

    Router::new()
        .nest(&prefix, api)
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

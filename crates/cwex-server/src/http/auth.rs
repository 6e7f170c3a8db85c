//! Login and profile routes.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, AuthUser};
use crate::storage::User;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// `GET /auth` -- the caller's own record, without the password hash.
pub async fn load_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.load_profile(user.user_id()).await?))
}

/// `POST /auth` -- exchange credentials for a session token (a JSON string).
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<String>, ApiError> {
    let token = state.auth.verify_login(&req.email, &req.password).await?;
    Ok(Json(token))
}

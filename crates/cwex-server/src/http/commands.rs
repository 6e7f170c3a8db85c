//! Machine command routes.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, AuthUser};
use crate::dispatch::DispatchedCommand;

#[derive(Deserialize)]
pub struct BlinkRequest {
    amount: u32,
}

/// `POST /machines/{id}/blink` -- publish `on <amount>` to the machine's task topic.
///
/// Requires a session whose `authorized` flag is set.
#[instrument(skip(state, user, req), fields(user_id = %user.user_id()))]
pub async fn blink_machine(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<BlinkRequest>,
) -> Result<Json<DispatchedCommand>, ApiError> {
    if !user.is_authorized() {
        warn!("Command rejected for unauthorized user");
        return Err(ApiError::Unauthorized(
            "User is not authorized to send commands".to_string(),
        ));
    }

    let sent = state.dispatcher.blink(&id, req.amount).await?;
    Ok(Json(sent))
}

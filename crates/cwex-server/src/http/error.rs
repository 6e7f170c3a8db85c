//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": "<message>"}` with a status
//! from the error taxonomy. Storage and transport details are logged, not
//! returned.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::auth::AuthError;
use crate::dispatch::DispatchError;
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Message broker unreachable")]
    Unavailable,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(_) => Self::NotFound(e.to_string()),
            RegistryError::Conflict { .. } => Self::Conflict(e.to_string()),
            RegistryError::NoOpEdit { .. }
            | RegistryError::UnknownFilter(_)
            | RegistryError::InvalidField(_) => Self::BadRequest(e.to_string()),
            RegistryError::Storage(inner) => {
                error!(error = %inner, "Registry storage failure");
                Self::Internal
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredential | AuthError::BadRequest(_) => {
                Self::BadRequest(e.to_string())
            }
            AuthError::Unauthorized => Self::Unauthorized(e.to_string()),
            AuthError::UserNotFound(_) => Self::NotFound(e.to_string()),
            AuthError::Signing(_) | AuthError::Hashing(_) | AuthError::Storage(_) => {
                error!(error = %e, "Authentication failure");
                Self::Internal
            }
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Registry(inner) => inner.into(),
            DispatchError::Unreachable(reason) => {
                error!(%reason, "Message broker unreachable");
                Self::Unavailable
            }
            DispatchError::Publish(reason) => {
                error!(%reason, "Publish failed");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

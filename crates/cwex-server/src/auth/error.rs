//! Authentication error types.

use cwex_core::db::DatabaseError;

/// Errors returned by [`super::CredentialVerifier`].
///
/// `InvalidCredential` covers both an unknown email and a wrong password.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid Credential")]
    InvalidCredential,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Token is not valid")]
    Unauthorized,

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

//! Error types for `cwex` core library.

use thiserror::Error;

/// Result type alias using `cwex` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `cwex` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A machine field failed validation
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

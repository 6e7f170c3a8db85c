//! Dispatch error types.

use crate::registry::RegistryError;

/// Errors that can occur while dispatching a command to a machine.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Topic resolution failed (unknown machine or storage failure).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Message broker unreachable: {0}")]
    Unreachable(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}

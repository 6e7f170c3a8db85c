//! Registry error types.

use cwex_core::db::DatabaseError;

/// Errors returned by [`super::MachineRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Machine {0} not found")]
    NotFound(String),

    #[error(
        "The machine with this information has already existed in the database. Please refer to {existing_id}"
    )]
    Conflict { existing_id: String },

    #[error("Editing the machine with the same information (Machine: {id})")]
    NoOpEdit { id: String },

    #[error("Unknown filter field: {0}")]
    UnknownFilter(String),

    #[error(transparent)]
    InvalidField(#[from] cwex_core::Error),

    #[error("Storage error: {0}")]
    Storage(DatabaseError),
}

impl From<DatabaseError> for RegistryError {
    fn from(e: DatabaseError) -> Self {
        Self::Storage(e)
    }
}

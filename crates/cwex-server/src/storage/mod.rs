//! `SQLite` storage for the cwex server.
//!
//! Provides persistence for users and machine records.

mod db;
mod models;
mod queries;


pub use db::{DatabaseError, RegistryDatabase};
pub use models::*;
pub use queries::MachineFilter;

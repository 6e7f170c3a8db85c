//! Machine registry.
//!
//! Enforces the uniqueness rules over `(location, branch, machineNumber)`
//! and implements list/create/get/update/delete of machine records.

mod error;
mod service;


pub use error::RegistryError;
pub use service::{MachineRegistry, filter_from_query};

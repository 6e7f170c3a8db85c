//! `cwex` Core Library
//!
//! Shared functionality for the `cwex` service:
//! - Machine identity triples and field validation
//! - MQTT topic path and command payload formatting
//! - `SQLite` pool helpers and the `define_database!` macro
//! - Tracing initialisation

pub mod db;
pub mod error;
pub mod topic;
pub mod tracing_init;
pub mod triple;

pub use error::{Error, Result};
pub use topic::{TopicPath, blink_payload};
pub use triple::{MachineTriple, TriplePatch};

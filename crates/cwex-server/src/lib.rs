//! cwex Server Library
//!
//! Core functionality for the cwex machine registry:
//! - `SQLite` storage for users and machine records
//! - Session tokens and password hashing
//! - Machine registry with triple uniqueness rules
//! - MQTT command dispatch to machine task topics
//! - axum HTTP routes

pub mod auth;
pub mod dispatch;
pub mod http;
pub mod registry;
pub mod storage;

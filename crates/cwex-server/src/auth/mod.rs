//! Authentication module for the cwex server.
//!
//! Provides session token management, password hashing, and the
//! credential verifier used by the login and profile endpoints.

pub mod claims;
mod error;
pub mod jwt;
pub mod password;
mod verifier;


pub use claims::Claims;
pub use error::AuthError;
pub use jwt::{DEFAULT_SESSION_TTL_SECS, JwtManager};
pub use verifier::CredentialVerifier;

//! Credential verification and session checks.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::claims::Claims;
use super::error::AuthError;
use super::jwt::JwtManager;
use super::password;
use crate::storage::{DatabaseError, RegistryDatabase, User};

/// Verifies logins against stored credentials and validates session tokens.
///
/// Stateless: a session is nothing more than a signed token, checked on every
/// protected request.
pub struct CredentialVerifier {
    db: RegistryDatabase,
    jwt: Arc<JwtManager>,
}

impl CredentialVerifier {
    pub const fn new(db: RegistryDatabase, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }

    /// Check an email/password pair and issue a session token.
    #[instrument(skip(self, password))]
    pub async fn verify_login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        validate_login_input(email, password)?;

        let user = match self.db.get_user_by_email(email).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                // Same argon2 cost as a real mismatch.
                if let Some(hash) = password::dummy_hash() {
                    let _ = password::verify_password(password, hash);
                }
                warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredential);
            }
            Err(e) => return Err(e.into()),
        };

        let matches = match password::verify_password(password, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                false
            }
        };
        if !matches {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::InvalidCredential);
        }

        let token = self
            .jwt
            .issue_session_token(&user.id, user.authorized)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Validate a session token's signature and expiry.
    pub fn verify_session(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt.validate(token).map_err(|_| AuthError::Unauthorized)
    }

    /// Load the caller's own user record.
    pub async fn load_profile(&self, user_id: &str) -> Result<User, AuthError> {
        self.db.get_user(user_id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => AuthError::UserNotFound(user_id.to_string()),
            other => other.into(),
        })
    }

    /// Create a user record with a freshly salted password hash.
    pub async fn provision_user(
        &self,
        email: &str,
        password: &str,
        authorized: bool,
    ) -> Result<User, AuthError> {
        validate_login_input(email, password)?;

        let hash =
            password::hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;
        let user_id = uuid::Uuid::new_v4().to_string();
        let user = self
            .db
            .create_user(&user_id, email, &hash, authorized)
            .await?;

        info!(user_id = %user.id, authorized, "User provisioned");
        Ok(user)
    }
}

fn validate_login_input(email: &str, password: &str) -> Result<(), AuthError> {
    if !looks_like_email(email) {
        return Err(AuthError::BadRequest("valid email is required"));
    }
    if password.is_empty() {
        return Err(AuthError::BadRequest("Please include password"));
    }
    Ok(())
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

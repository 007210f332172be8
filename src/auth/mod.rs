//! Credential verification.
//!
//! # Data Flow
//! ```text
//! Authorization: Basic ... / login form
//!     → basic.rs (decode header)
//!     → Authenticator::verify
//!         → UserDetailsService (username → user + roles)
//!         → PasswordVerifier (raw vs stored)
//!     → Principal or AuthError
//! ```
//!
//! # Design Decisions
//! - Storage and hashing are seams (traits), not implementations
//! - Unknown user and wrong password are indistinguishable to the caller

pub mod basic;
pub mod error;
pub mod password;
pub mod user;

use std::sync::Arc;

pub use error::AuthError;
pub use password::{PasswordVerifier, PlainTextVerifier};
pub use user::{InMemoryUserDetailsService, Principal, UserDetails, UserDetailsService};

/// Verifies username/password pairs against the configured seams.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserDetailsService>,
    passwords: Arc<dyn PasswordVerifier>,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserDetailsService>, passwords: Arc<dyn PasswordVerifier>) -> Self {
        Self { users, passwords }
    }

    pub fn verify(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let user = self
            .users
            .load_user(username)
            .ok_or(AuthError::BadCredentials)?;

        if self.passwords.verify(password, &user.password) {
            Ok(user.principal())
        } else {
            tracing::debug!(username = %username, "Password mismatch");
            Err(AuthError::BadCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator {
        let users = InMemoryUserDetailsService::new([UserDetails {
            username: "alice".into(),
            password: "s3cret".into(),
            roles: vec!["ADMIN".into()],
        }]);
        Authenticator::new(Arc::new(users), Arc::new(PlainTextVerifier))
    }

    #[test]
    fn test_verify_success() {
        let principal = authenticator().verify("alice", "s3cret").unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.roles, vec!["ADMIN".to_string()]);
    }

    #[test]
    fn test_unknown_user_and_wrong_password_look_the_same() {
        let auth = authenticator();
        assert_eq!(auth.verify("bob", "s3cret"), Err(AuthError::BadCredentials));
        assert_eq!(auth.verify("alice", "s3cre"), Err(AuthError::BadCredentials));
    }
}

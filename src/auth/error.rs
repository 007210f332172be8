//! Per-request security errors.
//!
//! These never escape the gateway: the responder turns each one into a response.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("full authentication is required to access this resource")]
    MissingCredentials,

    #[error("bad credentials")]
    BadCredentials,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("access to {path} is denied")]
    AccessDenied { path: String },

    #[error("invalid or missing CSRF token")]
    CsrfTokenMismatch,

    #[error("malformed login form: {0}")]
    MalformedLoginForm(String),
}

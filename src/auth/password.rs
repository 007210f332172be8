//! Password verification seam.
//!
//! Hashing algorithms are deliberately not part of the gateway; deployments plug their own
//! verifier in. `PlainTextVerifier` exists for development configs and tests.

pub trait PasswordVerifier: Send + Sync {
    /// Returns true if `raw` matches the stored `encoded` password.
    fn verify(&self, raw: &str, encoded: &str) -> bool;
}

/// Compares passwords verbatim. Do not use with real credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextVerifier;

impl PasswordVerifier for PlainTextVerifier {
    fn verify(&self, raw: &str, encoded: &str) -> bool {
        raw == encoded
    }
}

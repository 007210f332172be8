//! HTTP Basic `Authorization` header decoding.

use axum::http::{header, HeaderMap};
use base64::Engine;

use crate::auth::AuthError;

/// Extract `(username, password)` from an `Authorization: Basic` header.
///
/// Returns `Ok(None)` when no Basic credentials were sent.
pub fn extract_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(v) => v.to_str().map_err(|_| AuthError::MalformedHeader)?,
        None => return Ok(None),
    };

    let encoded = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("basic") => rest.trim(),
        _ => return Ok(None),
    };

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::MalformedHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;

    match decoded.split_once(':') {
        Some((user, pass)) => Ok(Some((user.to_string(), pass.to_string()))),
        None => Err(AuthError::MalformedHeader),
    }
}

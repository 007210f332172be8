//! Double-submit CSRF tokens.
//!
//! The token lives in a cookie readable by scripts; state-changing requests must echo it in a
//! header. Nothing is stored server-side.

use axum::http::{header, HeaderMap, HeaderValue, Method};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::security::features::CsrfSettings;

/// Value of cookie `name`, if present.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Safe methods never carry a token.
pub fn requires_token(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Cookie and header must both be present and equal on unsafe methods.
pub fn verify(method: &Method, headers: &HeaderMap, settings: &CsrfSettings) -> Result<(), AuthError> {
    if !requires_token(method) {
        return Ok(());
    }
    let cookie = read_cookie(headers, &settings.cookie_name);
    let echoed = headers
        .get(settings.header_name.as_str())
        .and_then(|v| v.to_str().ok());

    match (cookie, echoed) {
        (Some(cookie), Some(echoed)) if !cookie.is_empty() && cookie == echoed => Ok(()),
        _ => Err(AuthError::CsrfTokenMismatch),
    }
}

/// `Set-Cookie` value carrying a fresh token.
pub fn issue_cookie(settings: &CsrfSettings) -> Option<HeaderValue> {
    let cookie = format!(
        "{}={}; Path=/; SameSite=Lax",
        settings.cookie_name,
        Uuid::new_v4()
    );
    HeaderValue::from_str(&cookie).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: Option<&str>, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie {
            headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        if let Some(token) = token {
            headers.insert("X-XSRF-TOKEN", HeaderValue::from_str(token).unwrap());
        }
        headers
    }

    #[test]
    fn test_read_cookie() {
        let h = headers(Some("session=abc; XSRF-TOKEN=t1"), None);
        assert_eq!(read_cookie(&h, "XSRF-TOKEN"), Some("t1"));
        assert_eq!(read_cookie(&h, "session"), Some("abc"));
        assert_eq!(read_cookie(&h, "missing"), None);
    }

    #[test]
    fn test_verify_double_submit() {
        let settings = CsrfSettings::default();
        let ok = headers(Some("XSRF-TOKEN=t1"), Some("t1"));
        let mismatch = headers(Some("XSRF-TOKEN=t1"), Some("t2"));
        let no_header = headers(Some("XSRF-TOKEN=t1"), None);

        assert_eq!(verify(&Method::POST, &ok, &settings), Ok(()));
        assert_eq!(verify(&Method::POST, &mismatch, &settings), Err(AuthError::CsrfTokenMismatch));
        assert_eq!(verify(&Method::DELETE, &no_header, &settings), Err(AuthError::CsrfTokenMismatch));
        assert_eq!(verify(&Method::GET, &no_header, &settings), Ok(()));
    }

    #[test]
    fn test_issued_cookie_shape() {
        let value = issue_cookie(&CsrfSettings::default()).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("XSRF-TOKEN="));
        assert!(value.ends_with("; Path=/; SameSite=Lax"));
    }
}

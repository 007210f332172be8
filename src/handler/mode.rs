//! Response mode resolution.
//!
//! # Decision Table
//! ```text
//! configured Json      → Json
//! configured Redirect  → Redirect
//! configured Default   → Json     if X-Requested-With: XMLHttpRequest
//!                      → Json     if Accept does not prefer HTML
//!                      → Default  otherwise
//! ```
//!
//! `resolve` is a pure function of its arguments.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::events::EventKind;

/// How a security event is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleMode {
    /// Let the framework's built-in behavior answer.
    #[default]
    Default,
    /// JSON envelope.
    Json,
    /// HTTP redirect to a configured URL.
    Redirect,
}

impl HandleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleMode::Default => "default",
            HandleMode::Json => "json",
            HandleMode::Redirect => "redirect",
        }
    }
}

/// What the `Accept` header says about the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptClass {
    /// HTML is the preferred representation.
    Html,
    /// Something other than HTML is preferred.
    Other,
    /// No usable `Accept` header.
    Absent,
}

impl AcceptClass {
    /// Classify an `Accept` header value. The first entry with the highest `q` decides.
    ///
    /// Entries whose `q` is not a finite number are skipped; others are clamped to `0..=1`.
    pub fn from_header(value: &str) -> Self {
        let mut best: Option<(&str, f32)> = None;

        for entry in value.split(',') {
            let mut parts = entry.split(';');
            let media = parts.next().unwrap_or("").trim();
            if media.is_empty() {
                continue;
            }
            let q = match parts.find_map(|p| p.trim().strip_prefix("q=")) {
                None => 1.0,
                Some(raw) => match raw.trim().parse::<f32>() {
                    Ok(q) if q.is_finite() => q.clamp(0.0, 1.0),
                    _ => continue,
                },
            };

            if best.map_or(true, |(_, best_q)| q > best_q) {
                best = Some((media, q));
            }
        }

        match best {
            None => AcceptClass::Absent,
            Some((_, q)) if q <= 0.0 => AcceptClass::Other,
            Some((media, _)) if is_html(media) => AcceptClass::Html,
            Some(_) => AcceptClass::Other,
        }
    }
}

fn is_html(media: &str) -> bool {
    media.eq_ignore_ascii_case("text/html") || media.eq_ignore_ascii_case("application/xhtml+xml")
}

/// Request characteristics the resolver looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestSignals {
    /// `X-Requested-With: XMLHttpRequest` was present.
    pub xhr: bool,
    pub accept: AcceptClass,
}

impl RequestSignals {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let xhr = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
            .unwrap_or(false);

        let accept = headers
            .get_all(axum::http::header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            xhr,
            accept: AcceptClass::from_header(&accept),
        }
    }

    /// Browser navigation: no XHR marker and HTML preferred.
    pub fn prefers_html_page(&self) -> bool {
        !self.xhr && self.accept == AcceptClass::Html
    }
}

/// Resolve the mode for one event. The event kind does not currently change the outcome.
pub fn resolve(_kind: EventKind, configured: HandleMode, signals: &RequestSignals) -> HandleMode {
    match configured {
        HandleMode::Json => HandleMode::Json,
        HandleMode::Redirect => HandleMode::Redirect,
        HandleMode::Default if signals.prefers_html_page() => HandleMode::Default,
        HandleMode::Default => HandleMode::Json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const BROWSER_ACCEPT: &str =
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

    #[test]
    fn test_accept_classification() {
        assert_eq!(AcceptClass::from_header(BROWSER_ACCEPT), AcceptClass::Html);
        assert_eq!(AcceptClass::from_header("application/json"), AcceptClass::Other);
        assert_eq!(AcceptClass::from_header("*/*"), AcceptClass::Other);
        assert_eq!(AcceptClass::from_header(""), AcceptClass::Absent);
        assert_eq!(
            AcceptClass::from_header("application/json;q=0.5, text/html"),
            AcceptClass::Html
        );
        assert_eq!(
            AcceptClass::from_header("application/json, text/html"),
            AcceptClass::Other
        );
        assert_eq!(AcceptClass::from_header("text/html;q=0"), AcceptClass::Other);
    }

    #[test]
    fn test_accept_with_unusable_q_values() {
        assert_eq!(
            AcceptClass::from_header("text/html;q=NaN, application/json"),
            AcceptClass::Other
        );
        assert_eq!(
            AcceptClass::from_header("text/html;q=inf, application/json;q=0.5"),
            AcceptClass::Other
        );
        assert_eq!(
            AcceptClass::from_header("text/html;q=bogus, application/json;q=0"),
            AcceptClass::Other
        );
        assert_eq!(
            AcceptClass::from_header("application/json;q=7, text/html"),
            AcceptClass::Other
        );
        assert_eq!(AcceptClass::from_header("text/html;q=NaN"), AcceptClass::Absent);

        let signals = RequestSignals {
            xhr: false,
            accept: AcceptClass::from_header("text/html;q=NaN, application/json"),
        };
        assert_eq!(
            resolve(EventKind::AccessDenied, HandleMode::Default, &signals),
            HandleMode::Json
        );
    }

    #[test]
    fn test_signals_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert("Accept", HeaderValue::from_static(BROWSER_ACCEPT));
        let signals = RequestSignals::from_headers(&headers);
        assert!(signals.xhr);
        assert_eq!(signals.accept, AcceptClass::Html);
        assert!(!signals.prefers_html_page());
    }

    #[test]
    fn test_default_mode_follows_signals() {
        let browser = RequestSignals { xhr: false, accept: AcceptClass::Html };
        let ajax = RequestSignals { xhr: true, accept: AcceptClass::Html };
        let api = RequestSignals { xhr: false, accept: AcceptClass::Other };
        let bare = RequestSignals { xhr: false, accept: AcceptClass::Absent };

        let kind = EventKind::AccessDenied;
        assert_eq!(resolve(kind, HandleMode::Default, &browser), HandleMode::Default);
        assert_eq!(resolve(kind, HandleMode::Default, &ajax), HandleMode::Json);
        assert_eq!(resolve(kind, HandleMode::Default, &api), HandleMode::Json);
        assert_eq!(resolve(kind, HandleMode::Default, &bare), HandleMode::Json);
    }

    #[test]
    fn test_explicit_modes_win() {
        let browser = RequestSignals { xhr: false, accept: AcceptClass::Html };
        let ajax = RequestSignals { xhr: true, accept: AcceptClass::Other };
        for kind in EventKind::ALL {
            for signals in [&browser, &ajax] {
                assert_eq!(resolve(kind, HandleMode::Json, signals), HandleMode::Json);
                assert_eq!(resolve(kind, HandleMode::Redirect, signals), HandleMode::Redirect);
            }
        }
    }
}

//! Security events.
//!
//! # Data Flow
//! ```text
//! enforcement middleware / login / logout
//!     → SecurityEvent (one per occurrence)
//!     → handler::responder (resolve mode, compose response)
//!     → publisher.rs (fan out to listeners, bounded by a budget)
//!     → dropped
//! ```

pub mod publisher;

use std::fmt;
use std::time::SystemTime;

use axum::http::Request;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthError, Principal};
use crate::handler::mode::RequestSignals;
use crate::http::request::request_id;

pub use publisher::{AuditLogListener, EventPublisher, ListenerError, PublishReport, SecurityEventListener};

/// Kinds of security events that require a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MissingCredentials,
    AccessDenied,
    LoginSuccess,
    LoginFailure,
    LogoutSuccess,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::MissingCredentials,
        EventKind::AccessDenied,
        EventKind::LoginSuccess,
        EventKind::LoginFailure,
        EventKind::LogoutSuccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MissingCredentials => "missing_credentials",
            EventKind::AccessDenied => "access_denied",
            EventKind::LoginSuccess => "login_success",
            EventKind::LoginFailure => "login_failure",
            EventKind::LogoutSuccess => "logout_success",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of a request an event keeps.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: String,
    pub path: String,
    pub request_id: Option<String>,
    pub signals: RequestSignals,
}

impl RequestSnapshot {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().as_str().to_string(),
            path: req.uri().path().to_string(),
            request_id: request_id(req.headers()),
            signals: RequestSignals::from_headers(req.headers()),
        }
    }
}

/// One security occurrence. Consumed by the responder, then handed to the publisher.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub request: RequestSnapshot,
    pub principal: Option<Principal>,
    pub cause: Option<AuthError>,
    pub occurred_at: SystemTime,
}

impl SecurityEvent {
    pub fn new(kind: EventKind, request: RequestSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            request,
            principal: None,
            cause: None,
            occurred_at: SystemTime::now(),
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_cause(mut self, cause: AuthError) -> Self {
        self.cause = Some(cause);
        self
    }
}

//! Policy enforcement middleware.
//!
//! # Data Flow
//! ```text
//! request
//!     → ignore set ────────────────────────────▶ next (no policy at all)
//!     → CSRF double-submit ── mismatch ────────▶ AccessDenied
//!     → logout URL ────────────────────────────▶ LogoutSuccess
//!     → POST login processing URL ─────────────▶ LoginSuccess | LoginFailure
//!     → HTTP Basic ── bad / malformed ─────────▶ MissingCredentials
//!     → first matching rule
//!         PermitAll                            ▶ next
//!         Authenticated  + principal           ▶ next
//!         Authenticated  - principal           ▶ MissingCredentials
//!         DenyAll        + principal           ▶ AccessDenied
//!         DenyAll        - principal           ▶ MissingCredentials
//! ```
//!
//! Every event goes through `SecurityResponder::respond` exactly once. The gateway snapshot
//! is loaded once per request, so a concurrent reload never mixes two tables.

use axum::{
    body::Body,
    extract::{Form, FromRequest, State},
    http::{header, Method, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::auth::{basic, AuthError, Principal};
use crate::events::{EventKind, RequestSnapshot, SecurityEvent};
use crate::http::csrf;
use crate::http::server::AppState;
use crate::lifecycle::Gateway;
use crate::observability::metrics;
use crate::security::pattern::AntPattern;
use crate::security::rule_table::{AccessDecision, Verdict};

/// Fields posted to the login processing URL.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn security_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let gateway = state.gateway.load_full();

    if gateway
        .rules
        .ignore()
        .matches(req.method().as_str(), req.uri().path())
    {
        metrics::record_verdict("ignored", "none");
        return next.run(req).await;
    }

    let mut issue_token = None;
    if let Some(settings) = &gateway.rules.features().csrf {
        if let Err(cause) = csrf::verify(req.method(), req.headers(), settings) {
            tracing::warn!(path = %req.uri().path(), "CSRF token rejected");
            let event = SecurityEvent::new(EventKind::AccessDenied, RequestSnapshot::from_request(&req))
                .with_cause(cause);
            return gateway.responder.respond(event).await;
        }
        if csrf::read_cookie(req.headers(), &settings.cookie_name).is_none() {
            issue_token = csrf::issue_cookie(settings);
        }
    }

    let mut response = enforce(&gateway, req, next).await;
    if let Some(cookie) = issue_token {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

async fn enforce(gateway: &Gateway, mut req: Request<Body>, next: Next) -> Response {
    let snapshot = RequestSnapshot::from_request(&req);
    let features = gateway.rules.features();

    if let Some(logout) = &features.logout {
        if is_endpoint(&logout.url, &snapshot.path) {
            let mut event = SecurityEvent::new(EventKind::LogoutSuccess, snapshot);
            if let Ok(Some(principal)) = authenticate(gateway, &req) {
                event = event.with_principal(principal);
            }
            return gateway.responder.respond(event).await;
        }
    }

    if let Some(form) = &features.form_login {
        if req.method() == Method::POST && is_endpoint(&form.processing_url, &snapshot.path) {
            return login(gateway, req, snapshot).await;
        }
    }

    let principal = match authenticate(gateway, &req) {
        Ok(principal) => principal,
        Err(cause) => {
            tracing::debug!(path = %snapshot.path, error = %cause, "HTTP Basic authentication failed");
            let event = SecurityEvent::new(EventKind::MissingCredentials, snapshot).with_cause(cause);
            return gateway.responder.respond(event).await;
        }
    };

    // Fail closed when nothing matched.
    let (verdict, access) = match gateway.rules.decide(&snapshot.method, &snapshot.path) {
        Verdict::Matched(entry) => ("matched", entry.access),
        Verdict::Unmatched => ("unmatched", AccessDecision::Authenticated),
        Verdict::Ignored => ("ignored", AccessDecision::PermitAll),
    };
    metrics::record_verdict(verdict, access_label(access));
    tracing::debug!(
        method = %snapshot.method,
        path = %snapshot.path,
        verdict,
        access = %access,
        authenticated = principal.is_some(),
        "Policy decision"
    );

    match (access, principal) {
        (AccessDecision::PermitAll, principal) => {
            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }
            next.run(req).await
        }
        (AccessDecision::Authenticated, Some(principal)) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        (AccessDecision::DenyAll, Some(principal)) => {
            let cause = AuthError::AccessDenied {
                path: snapshot.path.clone(),
            };
            let event = SecurityEvent::new(EventKind::AccessDenied, snapshot)
                .with_principal(principal)
                .with_cause(cause);
            gateway.responder.respond(event).await
        }
        (AccessDecision::Authenticated | AccessDecision::DenyAll, None) => {
            let event = SecurityEvent::new(EventKind::MissingCredentials, snapshot)
                .with_cause(AuthError::MissingCredentials);
            gateway.responder.respond(event).await
        }
    }
}

/// HTTP Basic principal, if Basic is enabled and credentials were sent.
fn authenticate(gateway: &Gateway, req: &Request<Body>) -> Result<Option<Principal>, AuthError> {
    if gateway.rules.features().http_basic_realm.is_none() {
        return Ok(None);
    }
    match basic::extract_credentials(req.headers())? {
        Some((username, password)) => gateway.authenticator.verify(&username, &password).map(Some),
        None => Ok(None),
    }
}

async fn login(gateway: &Gateway, req: Request<Body>, snapshot: RequestSnapshot) -> Response {
    let outcome = match Form::<LoginForm>::from_request(req, &()).await {
        Ok(Form(form)) => gateway.authenticator.verify(&form.username, &form.password),
        Err(rejection) => Err(AuthError::MalformedLoginForm(rejection.body_text())),
    };

    let event = match outcome {
        Ok(principal) => {
            tracing::info!(username = %principal.username, "Form login succeeded");
            SecurityEvent::new(EventKind::LoginSuccess, snapshot).with_principal(principal)
        }
        Err(cause) => {
            tracing::info!(error = %cause, "Form login failed");
            SecurityEvent::new(EventKind::LoginFailure, snapshot).with_cause(cause)
        }
    };
    gateway.responder.respond(event).await
}

/// Endpoint URLs match the way rule patterns do, so `/logout/` is still the logout URL.
fn is_endpoint(url: &str, path: &str) -> bool {
    AntPattern::parse(url).is_ok_and(|endpoint| endpoint.matches(path))
}

fn access_label(access: AccessDecision) -> &'static str {
    match access {
        AccessDecision::PermitAll => "permit_all",
        AccessDecision::Authenticated => "authenticated",
        AccessDecision::DenyAll => "deny_all",
    }
}

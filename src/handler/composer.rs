//! Response composition.
//!
//! # Responsibilities
//! - Turn one event and one resolved mode into exactly one response
//! - Hold per-event templates (mode, redirect target, envelope code/message)
//! - Delegate `Default` to a pluggable `DefaultHandler`
//!
//! # Design Decisions
//! - `compose` returns the response by value; there is no second writer
//! - HTTP status for JSON is fixed by the event kind, the envelope `code` is configurable

use std::collections::BTreeMap;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::HandlerConfig;
use crate::events::{EventKind, SecurityEvent};
use crate::handler::envelope::ResponseEnvelope;
use crate::handler::mode::HandleMode;
use crate::security::features::SecurityFeatures;

/// The framework's own answer to an event, used when the resolved mode is `Default`.
pub trait DefaultHandler: Send + Sync {
    fn respond(&self, event: &SecurityEvent) -> Response;
}

/// Built-in default behavior, parameterised by the enabled features.
#[derive(Debug, Clone, Default)]
pub struct FrameworkDefaults {
    basic_realm: Option<String>,
    login_page: Option<String>,
}

impl FrameworkDefaults {
    pub fn from_features(features: &SecurityFeatures) -> Self {
        Self {
            basic_realm: features.http_basic_realm.clone(),
            login_page: features.form_login.as_ref().map(|f| f.login_page.clone()),
        }
    }

    fn login_page(&self) -> &str {
        self.login_page.as_deref().unwrap_or("/login")
    }
}

impl DefaultHandler for FrameworkDefaults {
    fn respond(&self, event: &SecurityEvent) -> Response {
        match event.kind {
            EventKind::MissingCredentials => {
                if let Some(realm) = &self.basic_realm {
                    let challenge = format!("Basic realm=\"{realm}\"");
                    let mut response = StatusCode::UNAUTHORIZED.into_response();
                    if let Ok(value) = HeaderValue::from_str(&challenge) {
                        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
                    }
                    response
                } else if let Some(login_page) = &self.login_page {
                    found(login_page)
                } else {
                    StatusCode::FORBIDDEN.into_response()
                }
            }
            EventKind::AccessDenied => StatusCode::FORBIDDEN.into_response(),
            EventKind::LoginSuccess => found("/"),
            EventKind::LoginFailure => found(&format!("{}?error", self.login_page())),
            EventKind::LogoutSuccess => found(&format!("{}?logout", self.login_page())),
        }
    }
}

/// How one event kind is answered when it is routed through the custom responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    pub mode: HandleMode,
    pub redirect_url: String,
    pub code: i32,
    pub message: String,
}

impl EventTemplate {
    /// Built-in template: `Default` mode, conventional code and message.
    pub fn builtin(kind: EventKind, redirect_url: impl Into<String>) -> Self {
        let (code, message) = match kind {
            EventKind::MissingCredentials => (401, "unauthorized"),
            EventKind::AccessDenied => (403, "forbidden"),
            EventKind::LoginSuccess => (200, "login success"),
            EventKind::LoginFailure => (401, "login failed"),
            EventKind::LogoutSuccess => (200, "logout success"),
        };
        Self {
            mode: HandleMode::Default,
            redirect_url: redirect_url.into(),
            code,
            message: message.to_string(),
        }
    }
}

/// HTTP status of a JSON answer, per event kind.
pub fn json_status(kind: EventKind) -> StatusCode {
    match kind {
        EventKind::MissingCredentials | EventKind::LoginFailure => StatusCode::UNAUTHORIZED,
        EventKind::AccessDenied => StatusCode::FORBIDDEN,
        EventKind::LoginSuccess | EventKind::LogoutSuccess => StatusCode::OK,
    }
}

/// Per-event templates plus the composition step.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    templates: BTreeMap<EventKind, EventTemplate>,
}

impl ResponseComposer {
    /// Built-in templates for every kind, all redirecting to `redirect_url`.
    pub fn new(redirect_url: &str) -> Self {
        Self {
            templates: EventKind::ALL
                .into_iter()
                .map(|kind| (kind, EventTemplate::builtin(kind, redirect_url)))
                .collect(),
        }
    }

    /// Apply `[handler.*]` overrides; a missing redirect target falls back to `redirect_url`.
    pub fn from_config(handlers: &HandlerConfig, redirect_url: &str) -> Self {
        let mut composer = Self::new(redirect_url);
        for kind in EventKind::ALL {
            let configured = handlers.for_kind(kind);
            let mut template = EventTemplate::builtin(kind, redirect_url);
            template.mode = configured.mode;
            if let Some(url) = &configured.redirect_url {
                template.redirect_url = url.clone();
            }
            if let Some(code) = configured.code {
                template.code = code;
            }
            if let Some(message) = &configured.message {
                template.message = message.clone();
            }
            composer.templates.insert(kind, template);
        }
        composer
    }

    pub fn with_template(mut self, kind: EventKind, template: EventTemplate) -> Self {
        self.templates.insert(kind, template);
        self
    }

    pub fn template(&self, kind: EventKind) -> EventTemplate {
        self.templates
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| EventTemplate::builtin(kind, "/"))
    }

    /// Build the single response for `event` in the already resolved `mode`.
    pub fn compose(
        &self,
        event: &SecurityEvent,
        mode: HandleMode,
        defaults: &dyn DefaultHandler,
    ) -> Response {
        match mode {
            HandleMode::Default => defaults.respond(event),
            HandleMode::Json => {
                let template = self.template(event.kind);
                let mut envelope = ResponseEnvelope::new(template.code, template.message);
                if event.kind == EventKind::LoginSuccess {
                    if let Some(data) = event
                        .principal
                        .as_ref()
                        .and_then(|p| serde_json::to_value(p).ok())
                    {
                        envelope = envelope.with_data(data);
                    }
                }
                envelope.into_response_with(json_status(event.kind))
            }
            HandleMode::Redirect => found(&self.template(event.kind).redirect_url),
        }
    }
}

/// `302 Found` with `Location`.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

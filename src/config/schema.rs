//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::events::EventKind;
use crate::handler::mode::HandleMode;
use crate::security::rule_table::AccessDecision;

/// Root configuration for the policy gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security policy settings.
    pub security: SecurityConfig,

    /// Per-event response handling.
    pub handler: HandlerConfig,

    /// Security event publication.
    pub events: EventsConfig,

    /// In-memory user store.
    pub users: Vec<UserConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// What the catch-all rule requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterceptAllMode {
    #[default]
    Authenticated,
    Deny,
}

impl From<InterceptAllMode> for AccessDecision {
    fn from(mode: InterceptAllMode) -> Self {
        match mode {
            InterceptAllMode::Authenticated => AccessDecision::Authenticated,
            InterceptAllMode::Deny => AccessDecision::DenyAll,
        }
    }
}

/// Security policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable HTTP Basic authentication.
    pub http_basic: bool,

    /// Realm announced in `WWW-Authenticate`.
    pub realm_name: String,

    /// Disable CSRF protection.
    pub close_csrf: bool,

    /// Disable CORS handling.
    pub close_cors: bool,

    /// Patterns that bypass enforcement (`"/static/**"`, `"GET /health"`).
    pub ignore_paths: Vec<String>,

    /// Page that renders the login form.
    pub login_page: String,

    /// URL the login form posts to.
    pub form_action_url: String,

    pub logout_url: String,

    /// Default redirect target, opened to everyone.
    pub redirect_url: String,

    pub token_endpoint: String,

    /// Requirement for requests no other rule matched.
    pub intercept_all: InterceptAllMode,

    pub remember_me: RememberMeConfig,

    pub session: SessionConfig,

    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            http_basic: true,
            realm_name: "policy-gateway".to_string(),
            close_csrf: true,
            close_cors: false,
            ignore_paths: Vec::new(),
            login_page: "/login".to_string(),
            form_action_url: "/auth/form".to_string(),
            logout_url: "/logout".to_string(),
            redirect_url: "/index".to_string(),
            token_endpoint: "/oauth/token".to_string(),
            intercept_all: InterceptAllMode::default(),
            remember_me: RememberMeConfig::default(),
            session: SessionConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Remember-me configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RememberMeConfig {
    pub enabled: bool,

    /// Form parameter that opts in.
    pub parameter: String,

    pub cookie_name: String,

    /// Token validity in seconds.
    pub validity_secs: u64,
}

impl Default for RememberMeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            parameter: "remember-me".to_string(),
            cookie_name: "remember-me".to_string(),
            validity_secs: 14 * 24 * 60 * 60,
        }
    }
}

/// Session management configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Concurrent sessions per user.
    pub max_sessions: u32,

    /// Landing page after session expiry. Empty disables it.
    pub invalid_session_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 8,
            invalid_session_url: "/session/invalid".to_string(),
        }
    }
}

/// CORS configuration. `"*"` means any.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["*".to_string()],
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }
}

/// Response handling for every security event kind.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HandlerConfig {
    pub missing_credentials: EventHandlerConfig,
    pub access_denied: EventHandlerConfig,
    pub login_success: EventHandlerConfig,
    pub login_failure: EventHandlerConfig,
    pub logout_success: EventHandlerConfig,
}

impl HandlerConfig {
    pub fn for_kind(&self, kind: EventKind) -> &EventHandlerConfig {
        match kind {
            EventKind::MissingCredentials => &self.missing_credentials,
            EventKind::AccessDenied => &self.access_denied,
            EventKind::LoginSuccess => &self.login_success,
            EventKind::LoginFailure => &self.login_failure,
            EventKind::LogoutSuccess => &self.logout_success,
        }
    }
}

/// Response handling for one event kind.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EventHandlerConfig {
    /// `default`, `json` or `redirect`.
    pub mode: HandleMode,

    /// Target for `redirect`; falls back to `security.redirect_url`.
    pub redirect_url: Option<String>,

    /// Envelope `code` override for `json`.
    pub code: Option<i32>,

    /// Envelope `message` override for `json`.
    pub message: Option<String>,
}

/// Security event publication.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Upper bound on listener delivery per event, in milliseconds.
    pub listener_budget_ms: u64,

    /// Write every event to the `security_audit` log target.
    pub audit_log: bool,

    /// Unfinished deliveries allowed per listener before further events skip it.
    pub max_in_flight: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            listener_budget_ms: 50,
            audit_log: true,
            max_in_flight: 16,
        }
    }
}

/// One in-memory user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub username: String,

    /// Stored as given; verified by the configured `PasswordVerifier`.
    pub password: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.events.listener_budget_ms, 50);
        assert_eq!(config.events.max_in_flight, 16);
        assert!(config.security.http_basic);
        assert_eq!(config.security.intercept_all, InterceptAllMode::Authenticated);
        assert_eq!(config.handler.access_denied.mode, HandleMode::Default);
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_handler_tables_parse() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [security]
            intercept_all = "deny"
            ignore_paths = ["/static/**", "GET /health"]

            [handler.login_failure]
            mode = "redirect"
            redirect_url = "/login?error"

            [handler.missing_credentials]
            mode = "json"
            code = 40100
            message = "please log in"

            [[users]]
            username = "alice"
            password = "secret"
            roles = ["admin"]
            "#,
        )
        .unwrap();

        assert_eq!(config.security.intercept_all, InterceptAllMode::Deny);
        assert_eq!(config.security.ignore_paths.len(), 2);
        let failure = config.handler.for_kind(EventKind::LoginFailure);
        assert_eq!(failure.mode, HandleMode::Redirect);
        assert_eq!(failure.redirect_url.as_deref(), Some("/login?error"));
        let missing = config.handler.for_kind(EventKind::MissingCredentials);
        assert_eq!(missing.code, Some(40100));
        assert_eq!(config.users[0].roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result: Result<GatewayConfig, _> = toml::from_str(
            r#"
            [handler.access_denied]
            mode = "html"
            "#,
        );
        assert!(result.is_err());
    }
}

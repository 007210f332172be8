//! Protocol and feature settings contributed by providers.
//!
//! These are the non-rule parts of a rule table: which authentication mechanisms are on,
//! where their endpoints live and which cross-cutting protections apply.

use serde::Serialize;

/// Form login endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormLoginSettings {
    /// Page that renders the login form.
    pub login_page: String,
    /// URL the login form posts to.
    pub processing_url: String,
}

/// Remember-me settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RememberMeSettings {
    /// Form parameter that opts in to remember-me.
    pub parameter: String,
    pub cookie_name: String,
    pub validity_secs: u64,
}

/// Session management settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSettings {
    /// Concurrent sessions allowed per user.
    pub max_sessions: u32,
    /// Landing page after a session expires.
    pub invalid_session_url: String,
}

/// Logout endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutSettings {
    pub url: String,
}

/// Cross-origin settings handed to the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

/// Double-submit CSRF protection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrfSettings {
    /// Cookie carrying the token issued to the client.
    pub cookie_name: String,
    /// Header the client must echo the token in.
    pub header_name: String,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            cookie_name: "XSRF-TOKEN".to_string(),
            header_name: "X-XSRF-TOKEN".to_string(),
        }
    }
}

/// Everything providers switched on besides access rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityFeatures {
    /// Realm for HTTP Basic; `None` when Basic is disabled.
    pub http_basic_realm: Option<String>,
    pub form_login: Option<FormLoginSettings>,
    pub remember_me: Option<RememberMeSettings>,
    pub session: Option<SessionSettings>,
    pub logout: Option<LogoutSettings>,
    pub cors: Option<CorsSettings>,
    pub csrf: Option<CsrfSettings>,
    /// Custom unauthenticated/denied entry points are installed.
    pub entry_points: bool,
}

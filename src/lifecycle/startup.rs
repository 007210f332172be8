//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into providers, an ignore set and a rule table
//! - Wire the responder, publisher and authenticator around that table
//! - Produce the `Gateway` state the HTTP layer serves from
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - This is the only place that knows which concrete providers exist
//! - Reloads go through the same `assemble` path as startup

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::auth::{Authenticator, InMemoryUserDetailsService, PlainTextVerifier};
use crate::config::{EventsConfig, GatewayConfig, SecurityConfig};
use crate::events::{AuditLogListener, EventPublisher};
use crate::handler::{ResponseComposer, SecurityResponder};
use crate::security::error::{BuildError, PatternError};
use crate::security::features::{CorsSettings, RememberMeSettings, SessionSettings};
use crate::security::ignore::{self, IgnoreSet};
use crate::security::orchestrator::PolicyOrchestrator;
use crate::security::provider::{
    CorsProvider, CsrfProvider, ExceptionProvider, FormLoginProvider, HttpBasicProvider,
    InterceptAllProvider, LogoutProvider, PermitAllProvider, RememberMeProvider, SessionProvider,
};
use crate::security::rule_table::RuleTable;

/// Errors that prevent the gateway state from being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("invalid ignore pattern: {0}")]
    IgnorePattern(#[from] PatternError),

    #[error("rule table build failed: {0}")]
    Build(#[from] BuildError),
}

/// Everything a request needs, swapped as one unit on reload.
#[derive(Clone)]
pub struct Gateway {
    pub rules: Arc<RuleTable>,
    pub responder: SecurityResponder,
    pub authenticator: Authenticator,
}

/// One provider per concern, configured from `[security]`.
pub fn default_providers(security: &SecurityConfig) -> PolicyOrchestrator {
    let remember_me = security.remember_me.enabled.then(|| RememberMeSettings {
        parameter: security.remember_me.parameter.clone(),
        cookie_name: security.remember_me.cookie_name.clone(),
        validity_secs: security.remember_me.validity_secs,
    });
    let cors = (!security.close_cors).then(|| CorsSettings {
        allowed_origins: security.cors.allowed_origins.clone(),
        allowed_methods: security.cors.allowed_methods.clone(),
        allowed_headers: security.cors.allowed_headers.clone(),
        allow_credentials: security.cors.allow_credentials,
        max_age_secs: security.cors.max_age_secs,
    });

    PolicyOrchestrator::new()
        .with_provider(ExceptionProvider::new())
        .with_provider(PermitAllProvider::new([
            &security.token_endpoint,
            &security.redirect_url,
            &security.login_page,
            &security.form_action_url,
            &security.logout_url,
        ]))
        .with_provider(FormLoginProvider::new(
            security.login_page.clone(),
            security.form_action_url.clone(),
        ))
        .with_provider(HttpBasicProvider::new(
            security.http_basic.then(|| security.realm_name.clone()),
        ))
        .with_provider(RememberMeProvider::new(remember_me))
        .with_provider(SessionProvider::new(SessionSettings {
            max_sessions: security.session.max_sessions,
            invalid_session_url: security.session.invalid_session_url.clone(),
        }))
        .with_provider(LogoutProvider::new(security.logout_url.clone()))
        .with_provider(CorsProvider::new(cors))
        .with_provider(CsrfProvider::new(!security.close_csrf))
        .with_provider(InterceptAllProvider::new(security.intercept_all.into()))
}

/// Configured ignore patterns united with the built-ins.
pub fn ignore_set(security: &SecurityConfig) -> Result<IgnoreSet, PatternError> {
    let configured = ignore::parse_patterns(&security.ignore_paths)?;
    Ok(ignore::resolve(&configured, &ignore::builtin_patterns()))
}

pub fn build_rule_table(security: &SecurityConfig) -> Result<RuleTable, StartupError> {
    let ignore = ignore_set(security)?;
    Ok(default_providers(security).build(ignore)?)
}

/// Publisher with the built-in listeners enabled by `[events]`.
pub fn build_publisher(events: &EventsConfig) -> EventPublisher {
    let publisher = EventPublisher::new(Duration::from_millis(events.listener_budget_ms))
        .with_max_in_flight(events.max_in_flight);
    if events.audit_log {
        publisher.with_listener(Arc::new(AuditLogListener))
    } else {
        publisher
    }
}

/// Assemble the gateway state with the publisher built from configuration.
pub fn assemble(config: &GatewayConfig) -> Result<Gateway, StartupError> {
    assemble_with_publisher(config, Arc::new(build_publisher(&config.events)))
}

/// Assemble the gateway state around an existing publisher.
pub fn assemble_with_publisher(
    config: &GatewayConfig,
    publisher: Arc<EventPublisher>,
) -> Result<Gateway, StartupError> {
    let table = build_rule_table(&config.security)?;
    let composer = ResponseComposer::from_config(&config.handler, &config.security.redirect_url);
    let responder = SecurityResponder::for_table(&table, composer, publisher);
    let authenticator = Authenticator::new(
        Arc::new(InMemoryUserDetailsService::from_config(&config.users)),
        Arc::new(PlainTextVerifier),
    );

    tracing::info!(
        rules = table.entries().len(),
        ignored = table.ignore().len(),
        users = config.users.len(),
        "Gateway state assembled"
    );

    Ok(Gateway {
        rules: Arc::new(table),
        responder,
        authenticator,
    })
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that every pattern compiles and every endpoint is an absolute path
//! - Detect conflicting endpoints and duplicate users
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::events::EventKind;
use crate::handler::mode::HandleMode;
use crate::security::pattern::RequestPattern;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One semantic problem, attributed to a config field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not one of {}", observability.log_level, LOG_LEVELS.join(", ")),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if config.events.listener_budget_ms == 0 {
        errors.push(ValidationError::new("events.listener_budget_ms", "must be greater than 0"));
    }
    if config.events.max_in_flight == 0 {
        errors.push(ValidationError::new("events.max_in_flight", "must be greater than 0"));
    }

    validate_security(config, &mut errors);
    validate_handlers(config, &mut errors);
    validate_users(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_security(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let security = &config.security;

    for (i, raw) in security.ignore_paths.iter().enumerate() {
        if let Err(e) = RequestPattern::parse(raw) {
            errors.push(ValidationError::new(format!("security.ignore_paths[{i}]"), e.to_string()));
        }
    }

    let endpoints = [
        ("security.login_page", &security.login_page),
        ("security.form_action_url", &security.form_action_url),
        ("security.logout_url", &security.logout_url),
        ("security.redirect_url", &security.redirect_url),
        ("security.token_endpoint", &security.token_endpoint),
    ];
    for (field, value) in endpoints {
        if !value.starts_with('/') {
            errors.push(ValidationError::new(field, format!("'{value}' must start with '/'")));
        }
    }
    if security.form_action_url == security.logout_url {
        errors.push(ValidationError::new(
            "security.logout_url",
            "must differ from security.form_action_url",
        ));
    }

    if security.http_basic && security.realm_name.contains('"') {
        errors.push(ValidationError::new("security.realm_name", "may not contain quotes"));
    }

    if security.remember_me.enabled && security.remember_me.validity_secs == 0 {
        errors.push(ValidationError::new(
            "security.remember_me.validity_secs",
            "must be greater than 0",
        ));
    }
    if security.session.max_sessions == 0 {
        errors.push(ValidationError::new("security.session.max_sessions", "must be greater than 0"));
    }

    if !security.close_cors {
        let cors = &security.cors;
        if cors.allowed_origins.is_empty() {
            errors.push(ValidationError::new(
                "security.cors.allowed_origins",
                "required unless security.close_cors is set",
            ));
        }
        if cors.allow_credentials && cors.allowed_origins.iter().any(|o| o == "*") {
            errors.push(ValidationError::new(
                "security.cors.allow_credentials",
                "cannot be combined with a wildcard origin",
            ));
        }
    }
}

fn validate_handlers(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    for kind in EventKind::ALL {
        let handler = config.handler.for_kind(kind);
        if handler.mode != HandleMode::Redirect {
            continue;
        }
        let target = handler
            .redirect_url
            .as_deref()
            .unwrap_or(&config.security.redirect_url);
        if target.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("handler.{kind}.redirect_url"),
                "required when mode is 'redirect'",
            ));
        }
    }
}

fn validate_users(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for (i, user) in config.users.iter().enumerate() {
        if user.username.trim().is_empty() {
            errors.push(ValidationError::new(format!("users[{i}].username"), "must not be empty"));
        } else if user.username.contains(':') {
            errors.push(ValidationError::new(format!("users[{i}].username"), "may not contain ':'"));
        } else if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::new(
                format!("users[{i}].username"),
                format!("duplicate user '{}'", user.username),
            ));
        }
        if user.password.is_empty() {
            errors.push(ValidationError::new(format!("users[{i}].password"), "must not be empty"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UserConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_event_limits_must_be_positive() {
        let mut config = GatewayConfig::default();
        config.events.listener_budget_ms = 0;
        config.events.max_in_flight = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["events.listener_budget_ms", "events.max_in_flight"]);
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.security.ignore_paths = vec!["static/**".into()];
        config.security.logout_url = config.security.form_action_url.clone();
        config.users = vec![
            UserConfig { username: "alice".into(), password: "a".into(), roles: vec![] },
            UserConfig { username: "alice".into(), password: "".into(), roles: vec![] },
        ];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.request_secs",
                "security.ignore_paths[0]",
                "security.logout_url",
                "users[1].username",
                "users[1].password",
            ]
        );
    }

    #[test]
    fn test_redirect_mode_needs_a_target() {
        let mut config = GatewayConfig::default();
        config.security.redirect_url = " ".into();
        config.handler.login_failure.mode = HandleMode::Redirect;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "handler.login_failure.redirect_url"));

        config.handler.login_failure.redirect_url = Some("/login?error".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().all(|e| e.field != "handler.login_failure.redirect_url"));
    }

    #[test]
    fn test_cors_checks_skipped_when_closed() {
        let mut config = GatewayConfig::default();
        config.security.cors.allowed_origins.clear();
        assert!(validate_config(&config).is_err());

        config.security.close_cors = true;
        assert!(validate_config(&config).is_ok());
    }
}

//! Protocol toggles: CORS and CSRF.

use crate::security::context::BuildContext;
use crate::security::error::ProviderError;
use crate::security::features::{CorsSettings, CsrfSettings};
use crate::security::provider::{PolicyProvider, ProviderKind};

/// Cross-origin resource sharing. Disabled when `security.close_cors` is set.
#[derive(Debug, Clone)]
pub struct CorsProvider {
    settings: Option<CorsSettings>,
    priority: i32,
}

impl CorsProvider {
    pub fn new(settings: Option<CorsSettings>) -> Self {
        Self {
            settings,
            priority: ProviderKind::Cors.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for CorsProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cors
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        let Some(settings) = &self.settings else {
            return Ok(());
        };
        if settings.allowed_origins.is_empty() {
            return Err(ProviderError::MissingSetting("security.cors.allowed_origins"));
        }
        let wildcard = settings.allowed_origins.iter().any(|o| o == "*");
        if wildcard && settings.allow_credentials {
            return Err(ProviderError::Conflict(
                "wildcard origin cannot be combined with credentials".to_string(),
            ));
        }
        ctx.features_mut().cors = Some(settings.clone());
        Ok(())
    }
}

/// Double-submit CSRF protection. Disabled when `security.close_csrf` is set.
#[derive(Debug, Clone)]
pub struct CsrfProvider {
    enabled: bool,
    priority: i32,
}

impl CsrfProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            priority: ProviderKind::Csrf.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for CsrfProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Csrf
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        if self.enabled {
            ctx.features_mut().csrf = Some(CsrfSettings::default());
        }
        Ok(())
    }
}

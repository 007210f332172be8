//! Session and logout providers.

use crate::events::EventKind;
use crate::security::context::BuildContext;
use crate::security::error::ProviderError;
use crate::security::features::{LogoutSettings, SessionSettings};
use crate::security::pattern::RequestPattern;
use crate::security::provider::{PolicyProvider, ProviderKind};
use crate::security::rule_table::AccessDecision;

/// Session management settings. The invalid-session landing page is opened to everyone.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    settings: SessionSettings,
    priority: i32,
}

impl SessionProvider {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            priority: ProviderKind::Session.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for SessionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Session
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        if self.settings.max_sessions == 0 {
            return Err(ProviderError::MissingSetting("security.session.max_sessions"));
        }
        if !self.settings.invalid_session_url.is_empty() {
            let path = self
                .settings
                .invalid_session_url
                .split('?')
                .next()
                .unwrap_or_default();
            ctx.add_rule(RequestPattern::parse(path)?, AccessDecision::PermitAll);
        }
        ctx.features_mut().session = Some(self.settings.clone());
        Ok(())
    }
}

/// Logout endpoint and the logout-success handler binding.
#[derive(Debug, Clone)]
pub struct LogoutProvider {
    url: String,
    priority: i32,
}

impl LogoutProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: ProviderKind::Logout.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for LogoutProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Logout
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        if self.url.trim().is_empty() {
            return Err(ProviderError::MissingSetting("security.logout_url"));
        }
        if ctx
            .features()
            .form_login
            .as_ref()
            .is_some_and(|f| f.processing_url == self.url)
        {
            return Err(ProviderError::Conflict(format!(
                "logout URL {} collides with the login processing URL",
                self.url
            )));
        }
        ctx.features_mut().logout = Some(LogoutSettings {
            url: self.url.clone(),
        });
        ctx.bind_event(EventKind::LogoutSuccess);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::ignore::IgnoreSet;
    use crate::security::provider::FormLoginProvider;

    #[test]
    fn test_session_opens_invalid_session_page() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        SessionProvider::new(SessionSettings {
            max_sessions: 1,
            invalid_session_url: "/session/invalid?expired".into(),
        })
        .apply(&mut ctx)
        .unwrap();

        let table = ctx.freeze();
        let entry = table.first_match("GET", "/session/invalid").unwrap();
        assert_eq!(entry.access, AccessDecision::PermitAll);
        assert_eq!(table.features().session.as_ref().unwrap().max_sessions, 1);
    }

    #[test]
    fn test_logout_collision_with_login_url() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        FormLoginProvider::new("/login", "/auth").apply(&mut ctx).unwrap();
        let err = LogoutProvider::new("/auth").apply(&mut ctx).unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
    }

    #[test]
    fn test_logout_binds_event() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        LogoutProvider::new("/logout").apply(&mut ctx).unwrap();
        let table = ctx.freeze();
        assert!(table.is_bound(EventKind::LogoutSuccess));
        assert_eq!(table.features().logout.as_ref().unwrap().url, "/logout");
    }
}

//! Authentication mechanism providers.

use crate::events::EventKind;
use crate::security::context::BuildContext;
use crate::security::error::ProviderError;
use crate::security::features::{FormLoginSettings, RememberMeSettings};
use crate::security::pattern::AntPattern;
use crate::security::provider::{PolicyProvider, ProviderKind};

/// Form login: login page, processing URL and the success/failure handler bindings.
#[derive(Debug, Clone)]
pub struct FormLoginProvider {
    settings: FormLoginSettings,
    priority: i32,
}

impl FormLoginProvider {
    pub fn new(login_page: impl Into<String>, processing_url: impl Into<String>) -> Self {
        Self {
            settings: FormLoginSettings {
                login_page: login_page.into(),
                processing_url: processing_url.into(),
            },
            priority: ProviderKind::FormLogin.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for FormLoginProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::FormLogin
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        if self.settings.login_page.trim().is_empty() {
            return Err(ProviderError::MissingSetting("security.login_page"));
        }
        if self.settings.processing_url.trim().is_empty() {
            return Err(ProviderError::MissingSetting("security.form_action_url"));
        }
        AntPattern::parse(&self.settings.processing_url)?;

        ctx.features_mut().form_login = Some(self.settings.clone());
        ctx.bind_event(EventKind::LoginSuccess);
        ctx.bind_event(EventKind::LoginFailure);
        Ok(())
    }
}

/// HTTP Basic authentication, switched by `security.http_basic`.
#[derive(Debug, Clone)]
pub struct HttpBasicProvider {
    realm: Option<String>,
    priority: i32,
}

impl HttpBasicProvider {
    /// `realm` is `None` when Basic is disabled.
    pub fn new(realm: Option<String>) -> Self {
        Self {
            realm,
            priority: ProviderKind::HttpBasic.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for HttpBasicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HttpBasic
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        match &self.realm {
            Some(realm) if realm.contains('"') => Err(ProviderError::Conflict(format!(
                "realm name {realm:?} may not contain quotes"
            ))),
            Some(realm) => {
                ctx.features_mut().http_basic_realm = Some(realm.clone());
                // Basic failures are answered by the unauthenticated entry point.
                ctx.bind_event(EventKind::MissingCredentials);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Remember-me settings, present only when enabled.
#[derive(Debug, Clone)]
pub struct RememberMeProvider {
    settings: Option<RememberMeSettings>,
    priority: i32,
}

impl RememberMeProvider {
    pub fn new(settings: Option<RememberMeSettings>) -> Self {
        Self {
            settings,
            priority: ProviderKind::RememberMe.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for RememberMeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RememberMe
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        if let Some(settings) = &self.settings {
            if settings.cookie_name.trim().is_empty() {
                return Err(ProviderError::MissingSetting("security.remember_me.cookie_name"));
            }
            if settings.validity_secs == 0 {
                return Err(ProviderError::MissingSetting("security.remember_me.validity_secs"));
            }
            ctx.features_mut().remember_me = Some(settings.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::ignore::IgnoreSet;

    #[test]
    fn test_form_login_binds_login_events() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        FormLoginProvider::new("/login", "/auth/form").apply(&mut ctx).unwrap();
        let table = ctx.freeze();

        let form = table.features().form_login.as_ref().unwrap();
        assert_eq!(form.processing_url, "/auth/form");
        assert!(table.is_bound(EventKind::LoginSuccess));
        assert!(table.is_bound(EventKind::LoginFailure));
        assert!(table.entries().is_empty());
    }

    #[test]
    fn test_form_login_requires_login_page() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        let err = FormLoginProvider::new(" ", "/auth/form").apply(&mut ctx).unwrap_err();
        assert_eq!(err, ProviderError::MissingSetting("security.login_page"));
    }

    #[test]
    fn test_http_basic_toggle() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        HttpBasicProvider::new(None).apply(&mut ctx).unwrap();
        assert!(ctx.features().http_basic_realm.is_none());

        HttpBasicProvider::new(Some("gateway".into())).apply(&mut ctx).unwrap();
        assert_eq!(ctx.features().http_basic_realm.as_deref(), Some("gateway"));

        let err = HttpBasicProvider::new(Some("bad\"realm".into()))
            .apply(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
    }

    #[test]
    fn test_remember_me_validation() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        let provider = RememberMeProvider::new(Some(RememberMeSettings {
            parameter: "remember-me".into(),
            cookie_name: "remember-me".into(),
            validity_secs: 0,
        }));
        assert!(provider.apply(&mut ctx).is_err());
        assert!(ctx.features().remember_me.is_none());
    }
}

//! Access-shaping providers: entry points, open endpoints and the catch-all.

use crate::events::EventKind;
use crate::security::context::BuildContext;
use crate::security::error::ProviderError;
use crate::security::pattern::{AntPattern, RequestPattern};
use crate::security::provider::{PolicyProvider, ProviderKind};
use crate::security::rule_table::AccessDecision;

/// Installs the unauthenticated and access-denied entry points.
#[derive(Debug, Clone)]
pub struct ExceptionProvider {
    priority: i32,
}

impl ExceptionProvider {
    pub fn new() -> Self {
        Self {
            priority: ProviderKind::Exception.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for ExceptionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyProvider for ExceptionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Exception
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        ctx.features_mut().entry_points = true;
        ctx.bind_event(EventKind::MissingCredentials);
        ctx.bind_event(EventKind::AccessDenied);
        Ok(())
    }
}

/// Opens a fixed list of paths to everyone.
#[derive(Debug, Clone)]
pub struct PermitAllProvider {
    paths: Vec<String>,
    priority: i32,
}

impl PermitAllProvider {
    /// Query strings are dropped, empty entries skipped and duplicates collapsed.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for path in paths {
            let path = path.as_ref().split('?').next().unwrap_or_default().trim();
            if !path.is_empty() && !unique.iter().any(|p| p == path) {
                unique.push(path.to_string());
            }
        }
        Self {
            paths: unique,
            priority: ProviderKind::PermitAll.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl PolicyProvider for PermitAllProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::PermitAll
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        for path in &self.paths {
            ctx.add_rule(RequestPattern::parse(path)?, AccessDecision::PermitAll);
        }
        Ok(())
    }
}

/// Catch-all rule for everything no earlier rule matched.
#[derive(Debug, Clone)]
pub struct InterceptAllProvider {
    access: AccessDecision,
    priority: i32,
}

impl InterceptAllProvider {
    pub fn new(access: AccessDecision) -> Self {
        Self {
            access,
            priority: ProviderKind::InterceptAll.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PolicyProvider for InterceptAllProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::InterceptAll
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        if self.access == AccessDecision::PermitAll {
            return Err(ProviderError::Conflict(
                "catch-all rule may not permit everything".to_string(),
            ));
        }
        ctx.add_rule(RequestPattern::any_method(AntPattern::parse("/**")?), self.access);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::ignore::IgnoreSet;

    #[test]
    fn test_permit_all_dedups_and_strips_query() {
        let provider = PermitAllProvider::new(["/login", "", "/oauth/token", "/login?error"]);
        assert_eq!(provider.paths(), ["/login", "/oauth/token"]);

        let mut ctx = BuildContext::new(IgnoreSet::new());
        ctx.enter(ProviderKind::PermitAll, provider.priority());
        provider.apply(&mut ctx).unwrap();

        assert_eq!(ctx.entries().len(), 2);
        assert_eq!(ctx.entries()[0].pattern.path().as_str(), "/login");
        assert_eq!(ctx.entries()[0].origin, ProviderKind::PermitAll);
        assert!(ctx.entries().iter().all(|e| e.access == AccessDecision::PermitAll));
    }

    #[test]
    fn test_intercept_all_refuses_to_open_everything() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        let err = InterceptAllProvider::new(AccessDecision::PermitAll)
            .apply(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
        assert!(ctx.entries().is_empty());
    }

    #[test]
    fn test_exception_binds_entry_points() {
        let mut ctx = BuildContext::new(IgnoreSet::new());
        ExceptionProvider::new().apply(&mut ctx).unwrap();
        let table = ctx.freeze();
        assert!(table.features().entry_points);
        assert!(table.is_bound(EventKind::MissingCredentials));
        assert!(table.is_bound(EventKind::AccessDenied));
        assert!(!table.is_bound(EventKind::LoginSuccess));
    }
}

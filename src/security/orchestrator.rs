//! Policy orchestration.
//!
//! # Responsibilities
//! - Hold the registered providers
//! - Order them deterministically (priority, then registration order)
//! - Run them against one fresh build context and freeze the result
//!
//! # Data Flow
//! ```text
//! providers ──sort──▶ [p1, p2, ... pn]
//!                          │ apply (in order)
//!                          ▼
//! IgnoreSet ──seed──▶ BuildContext ──freeze──▶ RuleTable
//! ```
//!
//! # Design Decisions
//! - A failing provider aborts the whole build; no partial table escapes
//! - The catch-all placement is checked before any provider runs

use std::time::Instant;

use crate::observability::metrics;
use crate::security::context::BuildContext;
use crate::security::error::BuildError;
use crate::security::ignore::IgnoreSet;
use crate::security::provider::{PolicyProvider, ProviderKind};
use crate::security::rule_table::RuleTable;

#[derive(Default)]
pub struct PolicyOrchestrator {
    providers: Vec<Box<dyn PolicyProvider>>,
}

impl PolicyOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Box<dyn PolicyProvider>) {
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: impl PolicyProvider + 'static) -> Self {
        self.register(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers in application order. `sort_by_key` is stable, so equal priorities keep
    /// registration order.
    fn ordered(&self) -> Vec<&dyn PolicyProvider> {
        let mut ordered: Vec<&dyn PolicyProvider> =
            self.providers.iter().map(|p| p.as_ref()).collect();
        ordered.sort_by_key(|p| p.priority());
        ordered
    }

    /// `(kind, priority)` pairs in application order.
    pub fn plan(&self) -> Vec<(ProviderKind, i32)> {
        self.ordered()
            .iter()
            .map(|p| (p.kind(), p.priority()))
            .collect()
    }

    /// Run every provider against a fresh context and freeze the result.
    pub fn build(&self, ignore: IgnoreSet) -> Result<RuleTable, BuildError> {
        let start = Instant::now();
        let ordered = self.ordered();
        check_catch_all_last(&ordered)?;

        let mut ctx = BuildContext::new(ignore);
        for provider in &ordered {
            let (kind, priority) = (provider.kind(), provider.priority());
            ctx.enter(kind, priority);
            if let Err(source) = provider.apply(&mut ctx) {
                tracing::error!(provider = %kind, priority, error = %source, "Policy provider failed");
                metrics::record_rule_table_build("failed", start);
                return Err(BuildError::Provider {
                    kind,
                    priority,
                    source,
                });
            }
            tracing::debug!(provider = %kind, priority, rules = ctx.entries().len(), "Applied policy provider");
        }

        let table = ctx.freeze();
        tracing::info!(
            providers = ordered.len(),
            rules = table.entries().len(),
            ignored = table.ignore().len(),
            "Rule table built"
        );
        metrics::record_rule_table_build("ok", start);
        Ok(table)
    }
}

fn check_catch_all_last(ordered: &[&dyn PolicyProvider]) -> Result<(), BuildError> {
    let catch_all = ordered
        .iter()
        .filter(|p| p.kind() == ProviderKind::InterceptAll)
        .map(|p| p.priority())
        .min();
    let Some(catch_all_priority) = catch_all else {
        return Ok(());
    };
    match ordered
        .iter()
        .filter(|p| p.kind() != ProviderKind::InterceptAll)
        .find(|p| p.priority() >= catch_all_priority)
    {
        Some(offender) => Err(BuildError::CatchAllNotLast {
            catch_all_priority,
            kind: offender.kind(),
            priority: offender.priority(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::error::ProviderError;
    use crate::security::provider::{
        CorsProvider, CsrfProvider, ExceptionProvider, FormLoginProvider, InterceptAllProvider,
        PermitAllProvider,
    };
    use crate::security::rule_table::{AccessDecision, Verdict};

    #[test]
    fn test_sorted_by_priority_regardless_of_registration() {
        let orchestrator = PolicyOrchestrator::new()
            .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
            .with_provider(CsrfProvider::new(true))
            .with_provider(PermitAllProvider::new(["/login"]))
            .with_provider(ExceptionProvider::new());

        let kinds: Vec<_> = orchestrator.plan().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                ProviderKind::Exception,
                ProviderKind::PermitAll,
                ProviderKind::Csrf,
                ProviderKind::InterceptAll,
            ]
        );
    }

    #[test]
    fn test_permit_all_precedes_catch_all() {
        let table = PolicyOrchestrator::new()
            .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
            .with_provider(PermitAllProvider::new(["/login"]))
            .build(IgnoreSet::new())
            .unwrap();

        match table.decide("GET", "/login") {
            Verdict::Matched(entry) => assert_eq!(entry.access, AccessDecision::PermitAll),
            other => panic!("unexpected verdict {other:?}"),
        }
        match table.decide("GET", "/orders") {
            Verdict::Matched(entry) => assert_eq!(entry.access, AccessDecision::Authenticated),
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn test_catch_all_not_last_is_rejected() {
        let err = PolicyOrchestrator::new()
            .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated).with_priority(50))
            .with_provider(PermitAllProvider::new(["/login"]))
            .build(IgnoreSet::new())
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::CatchAllNotLast {
                catch_all_priority: 50,
                kind: ProviderKind::PermitAll,
                priority: 100,
            }
        );
    }

    #[test]
    fn test_catch_all_tie_is_rejected() {
        let err = PolicyOrchestrator::new()
            .with_provider(CsrfProvider::new(true).with_priority(500))
            .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
            .build(IgnoreSet::new())
            .unwrap_err();
        assert!(matches!(err, BuildError::CatchAllNotLast { .. }));
    }

    #[test]
    fn test_failing_provider_aborts_build() {
        let err = PolicyOrchestrator::new()
            .with_provider(ExceptionProvider::new())
            .with_provider(FormLoginProvider::new("/login", ""))
            .with_provider(CorsProvider::new(None))
            .build(IgnoreSet::new())
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::Provider {
                kind: ProviderKind::FormLogin,
                priority: 200,
                source: ProviderError::MissingSetting("security.form_action_url"),
            }
        );
    }

    #[test]
    fn test_empty_orchestrator_builds_empty_table() {
        let table = PolicyOrchestrator::new().build(IgnoreSet::new()).unwrap();
        assert!(table.entries().is_empty());
        assert_eq!(table.decide("GET", "/anything"), Verdict::Unmatched);
    }
}

//! Rule table construction through the public orchestrator API.

use policy_gateway::security::{
    provider::{InterceptAllProvider, PermitAllProvider},
    AccessDecision, BuildContext, BuildError, IgnoreSet, PolicyOrchestrator, PolicyProvider,
    ProviderError, ProviderKind, RequestPattern, Verdict,
};

/// Adds one rule under a borrowed kind and priority.
struct FixedRule {
    kind: ProviderKind,
    priority: i32,
    pattern: &'static str,
    access: AccessDecision,
}

impl PolicyProvider for FixedRule {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError> {
        ctx.add_rule(RequestPattern::parse(self.pattern)?, self.access);
        Ok(())
    }
}

struct Failing;

impl PolicyProvider for Failing {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Session
    }

    fn priority(&self) -> i32 {
        230
    }

    fn apply(&self, _ctx: &mut BuildContext) -> Result<(), ProviderError> {
        Err(ProviderError::Conflict("session store unavailable".into()))
    }
}

#[test]
fn test_permit_all_wins_over_later_catch_all() {
    let table = PolicyOrchestrator::new()
        .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
        .with_provider(PermitAllProvider::new(["/oauth/token"]))
        .build(IgnoreSet::new())
        .unwrap();

    match table.decide("POST", "/oauth/token") {
        Verdict::Matched(entry) => {
            assert_eq!(entry.access, AccessDecision::PermitAll);
            assert_eq!(entry.origin, ProviderKind::PermitAll);
            assert_eq!(entry.priority, 100);
        }
        other => panic!("unexpected verdict {other:?}"),
    }
    assert_eq!(table.entries().len(), 2);
}

#[test]
fn test_failing_provider_yields_no_table() {
    let result = PolicyOrchestrator::new()
        .with_provider(PermitAllProvider::new(["/login"]))
        .with_provider(Failing)
        .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
        .build(IgnoreSet::new());

    let err = result.unwrap_err();
    assert_eq!(err.provider_kind(), ProviderKind::Session);
    assert!(matches!(err, BuildError::Provider { priority: 230, .. }));
    assert!(err.to_string().contains("session store unavailable"));
}

#[test]
fn test_equal_priority_keeps_registration_order() {
    let first = FixedRule {
        kind: ProviderKind::PermitAll,
        priority: 150,
        pattern: "/reports/**",
        access: AccessDecision::PermitAll,
    };
    let second = FixedRule {
        kind: ProviderKind::Logout,
        priority: 150,
        pattern: "/reports/**",
        access: AccessDecision::DenyAll,
    };

    let table = PolicyOrchestrator::new()
        .with_provider(first)
        .with_provider(second)
        .build(IgnoreSet::new())
        .unwrap();

    let entry = table.first_match("GET", "/reports/2024/q1").unwrap();
    assert_eq!(entry.access, AccessDecision::PermitAll);
    assert_eq!(table.entries()[1].origin, ProviderKind::Logout);
}

#[test]
fn test_ignore_short_circuits_rules() {
    let mut ignore = IgnoreSet::new();
    ignore.insert(RequestPattern::parse("/public/**").unwrap());

    let table = PolicyOrchestrator::new()
        .with_provider(InterceptAllProvider::new(AccessDecision::DenyAll))
        .build(ignore)
        .unwrap();

    assert_eq!(table.decide("GET", "/public/logo.png"), Verdict::Ignored);
    assert!(table.first_match("GET", "/public/logo.png").is_some());
}

#[test]
fn test_rebuild_is_deterministic() {
    let orchestrator = PolicyOrchestrator::new()
        .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
        .with_provider(PermitAllProvider::new(["/a", "/b"]));

    let first = orchestrator.build(IgnoreSet::new()).unwrap();
    let second = orchestrator.build(IgnoreSet::new()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.describe(), second.describe());
}

#[test]
fn test_describe_lists_rules_in_order() {
    let table = PolicyOrchestrator::new()
        .with_provider(InterceptAllProvider::new(AccessDecision::Authenticated))
        .with_provider(PermitAllProvider::new(["/login"]))
        .build(IgnoreSet::new())
        .unwrap();

    let described = table.describe();
    assert_eq!(described["rules"][0]["pattern"], "/login");
    assert_eq!(described["rules"][0]["access"], "permit_all");
    assert_eq!(described["rules"][1]["pattern"], "/**");
    assert_eq!(described["rules"][1]["provider"], "InterceptAll");
}

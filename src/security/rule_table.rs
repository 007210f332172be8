//! The frozen, first-match rule table.
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, no locks)
//! - Entry position encodes precedence; the first matching entry wins
//! - Ignore patterns are checked before any entry and short-circuit the lookup

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::events::EventKind;
use crate::security::features::SecurityFeatures;
use crate::security::ignore::IgnoreSet;
use crate::security::pattern::RequestPattern;
use crate::security::provider::ProviderKind;

/// What a matched rule requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Anyone, authenticated or not.
    PermitAll,
    /// Any authenticated principal.
    Authenticated,
    /// Nobody.
    DenyAll,
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::PermitAll => write!(f, "permit_all"),
            AccessDecision::Authenticated => write!(f, "authenticated"),
            AccessDecision::DenyAll => write!(f, "deny_all"),
        }
    }
}

/// One ordered entry and the provider that contributed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub pattern: RequestPattern,
    pub access: AccessDecision,
    pub origin: ProviderKind,
    pub priority: i32,
}

/// Result of looking a request up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// Matched an ignore pattern; enforcement is bypassed.
    Ignored,
    /// First matching entry.
    Matched(&'a RuleEntry),
    /// No entry matched.
    Unmatched,
}

impl Verdict<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Ignored => "ignored",
            Verdict::Matched(_) => "matched",
            Verdict::Unmatched => "unmatched",
        }
    }
}

/// Immutable output of an orchestration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
    ignore: IgnoreSet,
    features: SecurityFeatures,
    bound_events: BTreeSet<EventKind>,
}

impl RuleTable {
    pub(crate) fn new(
        entries: Vec<RuleEntry>,
        ignore: IgnoreSet,
        features: SecurityFeatures,
        bound_events: BTreeSet<EventKind>,
    ) -> Self {
        Self {
            entries,
            ignore,
            features,
            bound_events,
        }
    }

    /// Ignore check first, then first-match over the ordered entries.
    pub fn decide(&self, method: &str, path: &str) -> Verdict<'_> {
        if self.ignore.matches(method, path) {
            return Verdict::Ignored;
        }
        self.first_match(method, path)
            .map(Verdict::Matched)
            .unwrap_or(Verdict::Unmatched)
    }

    /// First matching entry, without consulting the ignore set.
    pub fn first_match(&self, method: &str, path: &str) -> Option<&RuleEntry> {
        self.entries.iter().find(|e| e.pattern.matches(method, path))
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn ignore(&self) -> &IgnoreSet {
        &self.ignore
    }

    pub fn features(&self) -> &SecurityFeatures {
        &self.features
    }

    /// True if some provider routed `kind` through the custom responder.
    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.bound_events.contains(&kind)
    }

    pub fn bound_events(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.bound_events.iter().copied()
    }

    /// Serializable view for the `rules` command.
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "ignore": self.ignore.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            "rules": self.entries.iter().map(|e| serde_json::json!({
                "pattern": e.pattern.to_string(),
                "access": e.access,
                "provider": e.origin.to_string(),
                "priority": e.priority,
            })).collect::<Vec<_>>(),
            "features": self.features,
            "bound_events": self.bound_events.iter().collect::<Vec<_>>(),
        })
    }
}

//! Mutable state of one orchestration pass.
//!
//! A `BuildContext` is created fresh for every build, owned by the orchestrator for the
//! duration of the pass and consumed by `freeze`. Providers only see it through `&mut`.

use std::collections::BTreeSet;

use crate::events::EventKind;
use crate::security::features::SecurityFeatures;
use crate::security::ignore::IgnoreSet;
use crate::security::pattern::RequestPattern;
use crate::security::provider::ProviderKind;
use crate::security::rule_table::{AccessDecision, RuleEntry, RuleTable};

#[derive(Debug)]
pub struct BuildContext {
    entries: Vec<RuleEntry>,
    ignore: IgnoreSet,
    features: SecurityFeatures,
    bound_events: BTreeSet<EventKind>,
    /// Provider currently applying, stamped on every entry it adds.
    current: (ProviderKind, i32),
}

impl BuildContext {
    pub fn new(ignore: IgnoreSet) -> Self {
        Self {
            entries: Vec::new(),
            ignore,
            features: SecurityFeatures::default(),
            bound_events: BTreeSet::new(),
            current: (ProviderKind::Exception, 0),
        }
    }

    pub(crate) fn enter(&mut self, kind: ProviderKind, priority: i32) {
        self.current = (kind, priority);
    }

    /// Append a rule after everything contributed so far.
    pub fn add_rule(&mut self, pattern: RequestPattern, access: AccessDecision) {
        let (origin, priority) = self.current;
        self.entries.push(RuleEntry {
            pattern,
            access,
            origin,
            priority,
        });
    }

    /// Route `kind` through the custom responder instead of the framework default.
    pub fn bind_event(&mut self, kind: EventKind) {
        self.bound_events.insert(kind);
    }

    pub fn features_mut(&mut self) -> &mut SecurityFeatures {
        &mut self.features
    }

    pub fn features(&self) -> &SecurityFeatures {
        &self.features
    }

    pub fn ignore(&self) -> &IgnoreSet {
        &self.ignore
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Convert into the immutable table.
    pub fn freeze(self) -> RuleTable {
        if let Some(pos) = self.entries.iter().position(|e| e.pattern.is_catch_all()) {
            for shadowed in &self.entries[pos + 1..] {
                tracing::warn!(
                    pattern = %shadowed.pattern,
                    provider = %shadowed.origin,
                    "Rule is unreachable behind an earlier catch-all"
                );
            }
        }
        RuleTable::new(self.entries, self.ignore, self.features, self.bound_events)
    }
}

//! Ignore-path resolution.
//!
//! Paths in the ignore set bypass enforcement entirely. Membership is all that matters,
//! so the set is unordered and re-adding a pattern is a no-op.

use std::collections::BTreeSet;

use crate::security::error::PatternError;
use crate::security::pattern::RequestPattern;

/// CORS preflight requests are never subject to policy.
pub const PREFLIGHT_PATTERN: &str = "OPTIONS /**";

/// Set of request patterns that bypass all policy enforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    patterns: BTreeSet<RequestPattern>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the pattern was not already present.
    pub fn insert(&mut self, pattern: RequestPattern) -> bool {
        self.patterns.insert(pattern)
    }

    pub fn contains(&self, pattern: &RequestPattern) -> bool {
        self.patterns.contains(pattern)
    }

    /// True if any pattern matches the request.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(method, path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestPattern> {
        self.patterns.iter()
    }
}

impl FromIterator<RequestPattern> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = RequestPattern>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}

/// Patterns that are always ignored.
pub fn builtin_patterns() -> IgnoreSet {
    let mut set = IgnoreSet::new();
    if let Ok(preflight) = RequestPattern::parse(PREFLIGHT_PATTERN) {
        set.insert(preflight);
    }
    set
}

/// Union of configured and built-in ignore patterns.
pub fn resolve(configured: &IgnoreSet, builtins: &IgnoreSet) -> IgnoreSet {
    configured.iter().chain(builtins.iter()).cloned().collect()
}

/// Parse configured pattern strings, failing on the first invalid one.
pub fn parse_patterns<S: AsRef<str>>(raw: &[S]) -> Result<IgnoreSet, PatternError> {
    raw.iter()
        .map(|s| RequestPattern::parse(s.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_include_preflight() {
        let builtins = builtin_patterns();
        assert!(builtins.matches("OPTIONS", "/api/orders"));
        assert!(!builtins.matches("GET", "/api/orders"));
    }

    #[test]
    fn test_resolve_is_idempotent_union() {
        let configured = parse_patterns(&["/static/**", "/favicon.ico", "/static/**"]).unwrap();
        assert_eq!(configured.len(), 2);

        let once = resolve(&configured, &builtin_patterns());
        let twice = resolve(&once, &builtin_patterns());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
        assert!(once.matches("GET", "/static/js/app.js"));
        assert!(once.matches("OPTIONS", "/whatever"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(parse_patterns(&["static/**"]).is_err());
    }
}

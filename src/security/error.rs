//! Build-time error types.
//!
//! Every variant here is startup-fatal: a rule table is either built completely or not at all.

use thiserror::Error;

use crate::security::provider::ProviderKind;

/// Errors raised while compiling a request pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("pattern '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("pattern '{0}' uses '**' inside a segment")]
    MisplacedDoubleStar(String),

    #[error("'{0}' is not a valid HTTP method")]
    InvalidMethod(String),
}

/// Errors a provider may report from `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),

    #[error("{0}")]
    Conflict(String),
}

/// Errors that abort a rule table build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("provider {kind} (priority {priority}) failed: {source}")]
    Provider {
        kind: ProviderKind,
        priority: i32,
        #[source]
        source: ProviderError,
    },

    #[error(
        "catch-all provider has priority {catch_all_priority} but {kind} has priority {priority}; \
         InterceptAll must be strictly last"
    )]
    CatchAllNotLast {
        catch_all_priority: i32,
        kind: ProviderKind,
        priority: i32,
    },
}

impl BuildError {
    /// The provider the failure is attributed to.
    pub fn provider_kind(&self) -> ProviderKind {
        match self {
            BuildError::Provider { kind, .. } => *kind,
            BuildError::CatchAllNotLast { .. } => ProviderKind::InterceptAll,
        }
    }
}

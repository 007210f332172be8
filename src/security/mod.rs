//! Security policy subsystem.
//!
//! # Data Flow
//! ```text
//! Startup / reload:
//!     config → ignore.rs (resolve ignore set)
//!            → provider/*.rs (one fragment per concern)
//!            → orchestrator.rs (sort, apply into context.rs)
//!            → rule_table.rs (frozen, shared via Arc)
//!
//! Per request:
//!     RuleTable::decide(method, path)
//!         → Ignored | Matched(entry) | Unmatched
//! ```
//!
//! # Design Decisions
//! - Providers never see each other; they only mutate the shared context
//! - Fail closed: an unmatched request is treated as requiring authentication
//! - No locks on the request path

pub mod context;
pub mod error;
pub mod features;
pub mod ignore;
pub mod orchestrator;
pub mod pattern;
pub mod provider;
pub mod rule_table;

pub use context::BuildContext;
pub use error::{BuildError, PatternError, ProviderError};
pub use features::SecurityFeatures;
pub use ignore::IgnoreSet;
pub use orchestrator::PolicyOrchestrator;
pub use pattern::{AntPattern, RequestPattern};
pub use provider::{PolicyProvider, ProviderKind};
pub use rule_table::{AccessDecision, RuleEntry, RuleTable, Verdict};

//! Policy providers.
//!
//! Each provider is a small, independent contributor to the shared `BuildContext`. The
//! orchestrator knows only this trait, never the providers' internals.
//!
//! # Priorities
//! ```text
//! Exception     10   entry points wrap everything
//! PermitAll    100   open endpoints must precede deny rules
//! FormLogin    200 ┐
//! HttpBasic    210 │
//! RememberMe   220 │ feature fragments + handler bindings
//! Session      230 │
//! Logout       240 ┘
//! Cors         300 ┐ protocol toggles
//! Csrf         310 ┘
//! InterceptAll 500   catch-all, strictly last
//! ```

pub mod access;
pub mod login;
pub mod protocol;
pub mod session;

use std::fmt;

use serde::Serialize;

use crate::security::context::BuildContext;
use crate::security::error::ProviderError;

pub use access::{ExceptionProvider, InterceptAllProvider, PermitAllProvider};
pub use login::{FormLoginProvider, HttpBasicProvider, RememberMeProvider};
pub use protocol::{CorsProvider, CsrfProvider};
pub use session::{LogoutProvider, SessionProvider};

/// Provider variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProviderKind {
    Cors,
    Csrf,
    FormLogin,
    HttpBasic,
    RememberMe,
    Session,
    Logout,
    Exception,
    PermitAll,
    InterceptAll,
}

impl ProviderKind {
    /// The documented priority of each built-in variant.
    pub const fn default_priority(self) -> i32 {
        match self {
            ProviderKind::Exception => 10,
            ProviderKind::PermitAll => 100,
            ProviderKind::FormLogin => 200,
            ProviderKind::HttpBasic => 210,
            ProviderKind::RememberMe => 220,
            ProviderKind::Session => 230,
            ProviderKind::Logout => 240,
            ProviderKind::Cors => 300,
            ProviderKind::Csrf => 310,
            ProviderKind::InterceptAll => 500,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Cors => "Cors",
            ProviderKind::Csrf => "Csrf",
            ProviderKind::FormLogin => "FormLogin",
            ProviderKind::HttpBasic => "HttpBasic",
            ProviderKind::RememberMe => "RememberMe",
            ProviderKind::Session => "Session",
            ProviderKind::Logout => "Logout",
            ProviderKind::Exception => "Exception",
            ProviderKind::PermitAll => "PermitAll",
            ProviderKind::InterceptAll => "InterceptAll",
        };
        f.write_str(name)
    }
}

/// A contributor of rule fragments to the shared pipeline.
pub trait PolicyProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Lower numbers apply first and therefore take precedence.
    fn priority(&self) -> i32;

    /// Mutate the build context. Must not depend on other providers' private state.
    fn apply(&self, ctx: &mut BuildContext) -> Result<(), ProviderError>;
}

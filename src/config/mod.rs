//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → lifecycle::startup (providers, responder, authenticator)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → http server rebuilds the gateway state
//!     → atomic swap, in-flight requests keep the old snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CorsConfig, EventHandlerConfig, EventsConfig, GatewayConfig, HandlerConfig, InterceptAllMode,
    ListenerConfig, ObservabilityConfig, RememberMeConfig, SecurityConfig, SessionConfig,
    TimeoutConfig, UserConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;

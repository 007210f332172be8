//! Policy Gateway Library
//!
//! Composes independently authored security policy fragments into one ordered rule table
//! and answers every security event with exactly one response: the framework default, a
//! JSON envelope or a redirect.

// Policy core
pub mod auth;
pub mod events;
pub mod handler;
pub mod security;

// Serving
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown};
pub use security::{PolicyOrchestrator, RuleTable};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, CORS)
//!     → middleware/security.rs (ignore, CSRF, login/logout, Basic, rule lookup)
//!         → security event → handler::SecurityResponder → response
//!         → or pass through to the echo handler
//!     → Send to client
//! ```

pub mod csrf;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};

//! Security event response dispatch.
//!
//! # Data Flow
//! ```text
//! SecurityEvent
//!     → responder.rs (configured mode, forced to Default if unbound)
//!     → mode.rs (resolve against request signals)
//!     → composer.rs (JSON envelope | 302 redirect | framework default)
//!     → one Response
//!     → events::publisher (listeners)
//! ```

pub mod composer;
pub mod envelope;
pub mod mode;
pub mod responder;

pub use composer::{DefaultHandler, EventTemplate, FrameworkDefaults, ResponseComposer};
pub use envelope::ResponseEnvelope;
pub use mode::{resolve, AcceptClass, HandleMode, RequestSignals};
pub use responder::SecurityResponder;

//! Structured logging for TheFrame.
//!
//! Handles subscriber setup, optional NDJSON file rotation, secret redaction,
//! and per-artwork run events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, RunEvent, RunEventEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;

//! `theframe-config`: TheFrame runtime configuration.
//!
//! Provides:
//! - `Settings` built once from `THEFRAME_*` environment variables
//! - Command line overrides
//! - Default values
//! - Per-command validation
//! - Redacted snapshots for debug output

pub mod defaults;
pub mod redact;
pub mod settings;
pub mod validation;

// Re-export most-used types at crate root.
pub use redact::{redact, redacted_settings};
pub use settings::{Overrides, Settings};
pub use validation::{
    validate_for_errors, validate_for_generate, validate_for_populate, validate_for_upload,
    ConfigValidationError, ValidationReport,
};

//! Run Event Logger
//!
//! Structured per-artwork outcomes (uploaded, enriched, failed) emitted under
//! the `theframe_events` target so a file log can be filtered down to them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    Uploaded {
        artwork_id: String,
        content_id: String,
    },
    Enriched {
        artwork_id: String,
        fields: Vec<String>,
    },
    EnrichmentFailed {
        artwork_id: String,
        error_msg: String,
    },
    Pruned {
        content_ids: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct RunEventEntry {
    pub command: String,
    pub timestamp: DateTime<Utc>,
    pub event: RunEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a run event, scrubbing secrets from free-text error messages.
    pub fn log_event(command: &str, mut event: RunEvent) -> RunEventEntry {
        if let RunEvent::EnrichmentFailed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }

        let entry = RunEventEntry {
            command: command.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(target: "theframe_events", event = ?entry, "Run event");
        entry
    }
}

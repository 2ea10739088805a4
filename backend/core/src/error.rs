use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared by every TheFrame crate.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("catalog not found: {}", .0.display())]
    CatalogNotFound(PathBuf),

    #[error("catalog at {} is malformed: {source}", path.display())]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write catalog {}: {message}", path.display())]
    CatalogWrite { path: PathBuf, message: String },

    #[error("image not found for artwork {id}: {reference}")]
    MissingImage { id: String, reference: String },

    #[error("failed to read image {reference}: {message}")]
    ImageSource { reference: String, message: String },

    #[error("image processing failed: {0}")]
    ImageProcessing(String),

    #[error("no usable font found (tried: {})", tried.join(", "))]
    FontUnavailable { tried: Vec<String> },

    #[error("TV at {host} is unreachable: {reason}")]
    TvUnreachable { host: String, reason: String },

    #[error("TV at {host} rejected the pairing token")]
    TvAuth { host: String },

    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("TV rejected request {request}: {message}")]
    TvRequest { request: String, message: String },

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("enrichment service error: {0}")]
    EnrichmentService(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameError {
    /// Whether the failure is a transient connection reset worth one retry.
    pub fn is_connection_reset(&self) -> bool {
        matches!(self, FrameError::ConnectionReset(_))
    }
}

pub type FrameResult<T> = std::result::Result<T, FrameError>;

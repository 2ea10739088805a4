//! `theframe-core`: data model, error taxonomy, and service seams shared by
//! the catalog, media, TV, and enrichment crates.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{FrameError, FrameResult};
pub use traits::{ArtDisplay, LlmProvider, LlmRequest, LlmResponse};
pub use types::{ArtworkRecord, Catalog, ImageFileType, ImageRef, MetadataField};

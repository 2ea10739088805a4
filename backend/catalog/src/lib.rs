//! `theframe-catalog`: the JSON catalog of artworks.
//!
//! Loading and atomic saving, completeness and consistency audits, the image
//! directory scan behind `generate`, and random selection for `upload`.

pub mod audit;
pub mod scan;
pub mod select;
pub mod store;

pub use audit::{
    audit, find_missing_fields, is_complete, is_placeholder, missing_fields, AuditReport,
    DuplicateArtwork, IncompleteRecord,
};
pub use scan::{clean_name, scan_images, slugify, ScanOutcome};
pub use select::{is_usable, pick_random, pick_random_with};
pub use store::{load, load_or_empty, save};

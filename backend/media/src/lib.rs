//! `theframe-media`: everything that touches pixels.
//!
//! The annotator draws an artwork's metadata onto a copy of its image; the
//! source helpers fetch image bytes and work out whether they are JPEG or PNG.

pub mod annotator;
pub mod fonts;
pub mod layout;
pub mod mime_detect;
pub mod source;

pub use annotator::Annotator;
pub use fonts::{default_font_candidates, resolve_font, ResolvedFont};
pub use layout::{overlay_lines, Band, LineStyle, OverlayLayout, OverlayLine};
pub use mime_detect::{detect_image_type, sniff_image_type};
pub use source::fetch_image;

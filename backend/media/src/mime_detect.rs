//! Image type detection.
//!
//! The TV must be told whether it is receiving a JPEG or a PNG, and catalog
//! file names are not always truthful, so the content is checked first.

use std::path::Path;

use theframe_core::ImageFileType;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Identify JPEG or PNG data by its leading bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<ImageFileType> {
    if bytes.starts_with(JPEG_MAGIC) {
        Some(ImageFileType::Jpeg)
    } else if bytes.starts_with(PNG_MAGIC) {
        Some(ImageFileType::Png)
    } else {
        None
    }
}

/// Type of an image file: content first, then extension, then JPEG.
pub fn detect_image_type(path: &Path, bytes: &[u8]) -> ImageFileType {
    sniff_image_type(bytes)
        .or_else(|| ImageFileType::from_path(path))
        .unwrap_or(ImageFileType::Jpeg)
}

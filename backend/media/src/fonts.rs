//! Font lookup for the overlay.

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use theframe_core::{FrameError, FrameResult};
use tracing::debug;

/// Bold sans-serif fonts shipped by common desktop and server distributions.
const SYSTEM_FONTS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    // Arch
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    // Fedora
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    // Debian / Ubuntu
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Candidate font files in priority order, an explicitly configured font first.
pub fn default_font_candidates(preferred: Option<&Path>) -> Vec<PathBuf> {
    preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// A parsed font and the file it came from.
pub struct ResolvedFont {
    pub path: PathBuf,
    pub font: FontVec,
}

impl std::fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFont").field("path", &self.path).finish()
    }
}

/// Load the first candidate that exists and parses as a TrueType/OpenType font.
pub fn resolve_font(candidates: &[PathBuf]) -> FrameResult<ResolvedFont> {
    for path in candidates {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Font candidate not readable");
                continue;
            }
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!(path = %path.display(), "Using overlay font");
                return Ok(ResolvedFont {
                    path: path.clone(),
                    font,
                });
            }
            Err(e) => debug!(path = %path.display(), error = %e, "Font candidate not parseable"),
        }
    }

    Err(FrameError::FontUnavailable {
        tried: candidates.iter().map(|p| p.display().to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_font_comes_first() {
        let candidates = default_font_candidates(Some(Path::new("/opt/fonts/Mine.ttf")));
        assert_eq!(candidates[0], PathBuf::from("/opt/fonts/Mine.ttf"));
        assert_eq!(candidates.len(), SYSTEM_FONTS.len() + 1);
        assert_eq!(default_font_candidates(None).len(), SYSTEM_FONTS.len());
    }

    #[test]
    fn unusable_candidates_report_every_path_tried() {
        let dir = std::env::temp_dir().join(format!("theframe-fonts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let not_a_font = dir.join("readme.ttf");
        std::fs::write(&not_a_font, b"definitely not a font").unwrap();
        let missing = dir.join("missing.ttf");

        let err = resolve_font(&[missing.clone(), not_a_font.clone()]).unwrap_err();
        match err {
            FrameError::FontUnavailable { tried } => {
                assert_eq!(tried, vec![missing.display().to_string(), not_a_font.display().to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        let _ = std::fs::remove_dir_all(dir);
    }
}

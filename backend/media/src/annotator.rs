//! Metadata overlay rendering.
//!
//! The annotator writes a JPEG copy of the source image with a shaded band in
//! the bottom-left corner listing title, author, century and location. The
//! output always goes to the same path and is overwritten on every call.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ab_glyph::PxScale;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use theframe_core::{ArtworkRecord, FrameError, FrameResult};
use tracing::{debug, info};

use crate::fonts::{resolve_font, ResolvedFont};
use crate::layout::{overlay_lines, Band, OverlayLayout};

const JPEG_QUALITY: u8 = 95;
/// Opacity of the black band (0 = invisible, 1 = solid).
const BAND_OPACITY: f32 = 0.7;
const BORDER_COLOR: Rgb<u8> = Rgb([200, 200, 200]);

pub struct Annotator {
    font: ResolvedFont,
    output_path: PathBuf,
}

impl Annotator {
    /// Resolve a font from `font_candidates`; fails with `FontUnavailable`
    /// when none of them can be used.
    pub fn new(font_candidates: &[PathBuf], output_path: impl Into<PathBuf>) -> FrameResult<Self> {
        Ok(Self {
            font: resolve_font(font_candidates)?,
            output_path: output_path.into(),
        })
    }

    pub fn font_path(&self) -> &Path {
        &self.font.path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Annotate the image at `image_path`; the source file is left untouched.
    pub fn annotate(&self, image_path: &Path, record: &ArtworkRecord) -> FrameResult<PathBuf> {
        let image = image::open(image_path).map_err(|e| {
            FrameError::ImageProcessing(format!("cannot decode {}: {e}", image_path.display()))
        })?;
        self.write(self.render(&image, record))
    }

    /// Annotate an already downloaded image.
    pub fn annotate_bytes(&self, bytes: &[u8], record: &ArtworkRecord) -> FrameResult<PathBuf> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FrameError::ImageProcessing(format!("cannot decode image: {e}")))?;
        self.write(self.render(&image, record))
    }

    /// Draw the overlay onto an RGB copy of `image`.
    pub fn render(&self, image: &DynamicImage, record: &ArtworkRecord) -> RgbImage {
        let mut canvas = image.to_rgb8();
        let (width, height) = canvas.dimensions();
        let lines = overlay_lines(record);
        let layout = OverlayLayout::for_image(width, height, lines.len());

        let text_width = lines
            .iter()
            .enumerate()
            .map(|(i, line)| text_size(PxScale::from(layout.line_px(i)), &self.font.font, &line.text).0)
            .max()
            .unwrap_or(0);
        let band = layout.band(text_width);
        debug!(width, height, ?band, "Overlay geometry");

        shade(&mut canvas, &band);
        if band.width > 2 && band.height > 2 {
            let border = Rect::at(band.x as i32, band.y as i32).of_size(band.width, band.height);
            draw_hollow_rect_mut(&mut canvas, border, BORDER_COLOR);
        }

        for (i, (line, (x, y))) in lines.iter().zip(layout.line_origins(&band)).enumerate() {
            draw_text_mut(
                &mut canvas,
                Rgb(line.style.color()),
                x,
                y,
                PxScale::from(layout.line_px(i)),
                &self.font.font,
                &line.text,
            );
        }
        canvas
    }

    fn write(&self, canvas: RgbImage) -> FrameResult<PathBuf> {
        let out = &self.output_path;
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                FrameError::ImageProcessing(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let file = File::create(out).map_err(|e| {
            FrameError::ImageProcessing(format!("cannot create {}: {e}", out.display()))
        })?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        encoder
            .encode_image(&DynamicImage::ImageRgb8(canvas))
            .map_err(|e| FrameError::ImageProcessing(format!("cannot encode JPEG: {e}")))?;

        info!(path = %out.display(), "Wrote annotated image");
        Ok(out.clone())
    }
}

/// Darken the band in place, blending each pixel towards black.
fn shade(canvas: &mut RgbImage, band: &Band) {
    for y in band.y..band.y + band.height {
        for x in band.x..band.x + band.width {
            let pixel = canvas.get_pixel_mut(x, y);
            for channel in pixel.0.iter_mut() {
                *channel = (f32::from(*channel) * (1.0 - BAND_OPACITY)).round() as u8;
            }
        }
    }
}

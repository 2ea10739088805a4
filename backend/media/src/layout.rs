//! Overlay text and geometry. No pixels are touched here.

use theframe_core::{ArtworkRecord, MetadataField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Author,
    Detail,
}

impl LineStyle {
    /// RGB text colour.
    pub fn color(self) -> [u8; 3] {
        match self {
            LineStyle::Title => [255, 255, 255],
            LineStyle::Author => [255, 239, 180],
            LineStyle::Detail => [170, 190, 225],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLine {
    pub text: String,
    pub style: LineStyle,
}

/// The lines drawn for `record`: title, author, century, location.
pub fn overlay_lines(record: &ArtworkRecord) -> Vec<OverlayLine> {
    let value = |field: MetadataField| {
        let raw = record.field(field).trim();
        if raw.is_empty() {
            format!("Unknown {}", field.label())
        } else {
            raw.to_string()
        }
    };

    let mut century = value(MetadataField::Century);
    if let Some(year) = record.year.as_deref().map(str::trim).filter(|y| !y.is_empty()) {
        century = format!("{century} ({year})");
    }

    vec![
        OverlayLine {
            text: value(MetadataField::Title),
            style: LineStyle::Title,
        },
        OverlayLine {
            text: value(MetadataField::Author),
            style: LineStyle::Author,
        },
        OverlayLine {
            text: century,
            style: LineStyle::Detail,
        },
        OverlayLine {
            text: value(MetadataField::Location),
            style: LineStyle::Detail,
        },
    ]
}

/// Rectangle of the shaded band, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Font sizes and spacing for a given image size.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub image_width: u32,
    pub image_height: u32,
    pub title_px: f32,
    pub body_px: f32,
    pub margin: u32,
    pub padding: u32,
    pub line_gap: u32,
    pub line_count: usize,
}

const TITLE_SCALE: f32 = 0.035;
const BODY_SCALE: f32 = 0.024;
const MIN_TITLE_PX: f32 = 16.0;
const MIN_BODY_PX: f32 = 11.0;

impl OverlayLayout {
    pub fn for_image(width: u32, height: u32, line_count: usize) -> Self {
        let h = height as f32;
        let title_px = (h * TITLE_SCALE).max(MIN_TITLE_PX);
        let body_px = (h * BODY_SCALE).max(MIN_BODY_PX);
        Self {
            image_width: width,
            image_height: height,
            title_px,
            body_px,
            margin: (width.min(height) / 30).max(8),
            padding: ((body_px * 0.8) as u32).max(6),
            line_gap: ((body_px * 0.4) as u32).max(2),
            line_count,
        }
    }

    /// Pixel size for line `index` (the first line is the title).
    pub fn line_px(&self, index: usize) -> f32 {
        if index == 0 {
            self.title_px
        } else {
            self.body_px
        }
    }

    /// Height of the band needed to hold every line with padding.
    pub fn content_height(&self) -> u32 {
        let text: f32 = (0..self.line_count).map(|i| self.line_px(i).ceil()).sum();
        let gaps = self.line_gap * self.line_count.saturating_sub(1) as u32;
        text as u32 + gaps + 2 * self.padding
    }

    /// Band for text whose widest line is `text_width` pixels, anchored at the
    /// bottom-left margin and clamped inside the image.
    pub fn band(&self, text_width: u32) -> Band {
        let width = (text_width + 2 * self.padding).min(self.image_width);
        let height = self.content_height().min(self.image_height);
        let x = self.margin.min(self.image_width - width);
        let y = self.image_height.saturating_sub(height + self.margin);
        Band {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left origin of each line inside `band`.
    pub fn line_origins(&self, band: &Band) -> Vec<(i32, i32)> {
        let x = (band.x + self.padding) as i32;
        let mut y = (band.y + self.padding) as i32;
        (0..self.line_count)
            .map(|i| {
                let origin = (x, y);
                y += self.line_px(i).ceil() as i32 + self.line_gap as i32;
                origin
            })
            .collect()
    }
}

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use anyhow::Context;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::models::{DetectionSet, PixelBox};

const BOX_COLOR: Rgb<u8> = Rgb([255, 180, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const FOOTER_COLOR: Rgb<u8> = Rgb([200, 200, 200]);

const CENTER_RADIUS: i32 = 8;
const FONT_SCALE: f32 = 18.0;

/// Draws a DetectionSet's boxes, labels and an optional timestamp footer
/// onto the source image.
pub struct Annotator {
    /// Label font. When `None`, all text rendering is skipped and only the
    /// boxes and center dots are drawn.
    pub font: Option<FontVec>,
    pub thickness: u32,
    pub timestamp: bool,
    pub verbose: bool,
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            font: None,
            thickness: 3,
            timestamp: false,
            verbose: false,
        }
    }

    /// Load the label font from an explicit path.
    pub fn with_font_path(mut self, path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| anyhow::anyhow!("Failed to parse font file: {}", path.display()))?;
        self.font = Some(font);
        Ok(self)
    }

    /// Probe common system font locations. When none loads, text rendering
    /// is skipped.
    pub fn with_system_font(mut self) -> Self {
        const FONT_PATHS: [&str; 3] = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/System/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];

        for path in FONT_PATHS {
            if let Ok(data) = std::fs::read(path) {
                if let Ok(font) = FontVec::try_from_vec(data) {
                    self.font = Some(font);
                    break;
                }
            }
        }
        self
    }

    /// Box outline thickness in pixels.
    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness;
        self
    }

    /// Draw an RFC 3339 timestamp footer (requires a font).
    pub fn with_timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Draw the set's detections onto a copy of the image.
    ///
    /// The image must have the dimensions the set was exported from;
    /// otherwise the pixel boxes would not correspond.
    pub fn annotate(&self, img: &DynamicImage, set: &DetectionSet) -> anyhow::Result<RgbImage> {
        if img.width() != set.width || img.height() != set.height {
            anyhow::bail!(
                "Image is {}x{} but detections were recorded for {}x{}",
                img.width(),
                img.height(),
                set.width,
                set.height
            );
        }

        let mut canvas = img.to_rgb8();

        for (i, detection) in set.detections.iter().enumerate() {
            if self.verbose {
                let name = detection.class_name.as_deref().unwrap_or("?");
                println!(
                    "  Box {} at ({}, {}) - {} ({:.2})",
                    i + 1,
                    detection.bbox.x1,
                    detection.bbox.y1,
                    name,
                    detection.confidence
                );
            }

            self.draw_box(&mut canvas, &detection.bbox);
            self.draw_center(&mut canvas, &detection.bbox);

            if let Some(font) = &self.font {
                let label = match &detection.class_name {
                    Some(name) => format!("{} {:.2}", name, detection.confidence),
                    None => format!("class_{} {:.2}", detection.class_id, detection.confidence),
                };
                let x = detection.bbox.x1 as i32;
                let y = (detection.bbox.y1 as i32 - FONT_SCALE as i32 - 4).max(4);
                draw_text_mut(&mut canvas, LABEL_COLOR, x, y, FONT_SCALE, font, &label);
            }
        }

        if self.timestamp {
            if let Some(font) = &self.font {
                let stamp = OffsetDateTime::now_local()
                    .unwrap_or_else(|_| OffsetDateTime::now_utc())
                    .format(&Rfc3339)?;
                let y = set.height.saturating_sub(FONT_SCALE as u32 + 10) as i32;
                draw_text_mut(&mut canvas, FOOTER_COLOR, 8, y, FONT_SCALE, font, &stamp);
            }
        }

        Ok(canvas)
    }

    fn draw_box(&self, canvas: &mut RgbImage, bbox: &PixelBox) {
        if bbox.width() == 0 || bbox.height() == 0 {
            return;
        }
        let (img_width, img_height) = (canvas.width() as i32, canvas.height() as i32);

        for t in 0..self.thickness as i32 {
            let rect = Rect::at(bbox.x1 as i32 - t, bbox.y1 as i32 - t)
                .of_size(bbox.width() + 2 * t as u32, bbox.height() + 2 * t as u32);

            if rect.left() >= 0
                && rect.top() >= 0
                && rect.right() < img_width
                && rect.bottom() < img_height
            {
                draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
            }
        }
    }

    fn draw_center(&self, canvas: &mut RgbImage, bbox: &PixelBox) {
        let (cx, cy) = bbox.center();
        draw_filled_circle_mut(canvas, (cx as i32, cy as i32), CENTER_RADIUS, CENTER_COLOR);
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

/// Default output path: `<stem>_annotated.png` beside the input image.
pub fn default_output_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image_path.with_file_name(format!("{}_annotated.png", stem))
}

/// Find the DetectionSet recorded for an image, matched by file name.
pub fn find_set_for_image<'a>(
    sets: &'a [DetectionSet],
    image_path: &Path,
) -> Option<&'a DetectionSet> {
    let name = image_path.file_name()?.to_string_lossy();
    sets.iter().find(|set| set.image == name)
}

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// YOLO-style normalized box: center and size as fractions of the image
/// dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl NormBox {
    /// Convert to pixel corners, clamped to the image and rounded to the
    /// nearest pixel.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelBox {
        let x_center = self.cx * width as f32;
        let y_center = self.cy * height as f32;
        let box_w = self.w * width as f32;
        let box_h = self.h * height as f32;

        let clamp = |value: f32, max: u32| value.clamp(0.0, max as f32).round() as u32;

        PixelBox {
            x1: clamp(x_center - box_w / 2.0, width),
            y1: clamp(y_center - box_h / 2.0, height),
            x2: clamp(x_center + box_w / 2.0, width),
            y2: clamp(y_center + box_h / 2.0, height),
        }
    }
}

/// Absolute pixel rectangle with x1 <= x2 and y1 <= y2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelBox {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Get center coordinates
    pub fn center(&self) -> (u32, u32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

/// One detected object instance. `class_name` stays `None` until resolved
/// against a class-name table and serializes as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub class_id: u32,
    pub class_name: Option<String>,
    pub confidence: f32,
    pub bbox: PixelBox,
    pub bbox_norm: NormBox,
}

/// All detections for one image, in detector emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSet {
    pub image: String,
    #[serde(default)]
    pub image_path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<DetectionRecord>,
    /// Present only on refiner output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RefineMeta>,
}

/// Refinement metadata attached to each surviving image record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineMeta {
    pub num_detections: usize,
    pub num_original: usize,
    pub min_conf_applied: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_filter: Option<Vec<String>>,
}

/// Read a detection artifact: a JSON array of DetectionSets.
pub fn read_artifact(path: &Path) -> anyhow::Result<Vec<DetectionSet>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Input JSON not found: {}", path.display()))?;
    let sets = serde_json::from_str(&text)
        .with_context(|| format!("Invalid detection JSON: {}", path.display()))?;
    Ok(sets)
}

/// Write a detection artifact, creating parent directories as needed.
pub fn write_artifact(path: &Path, sets: &[DetectionSet]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(sets)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

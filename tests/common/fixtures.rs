use std::path::{Path, PathBuf};

use detsift::labels::ClassTable;
use detsift::models::{DetectionRecord, DetectionSet, NormBox};
use image::{ImageBuffer, Rgb};
use tempfile::TempDir;

/// Creates a solid dark-gray PNG with the given dimensions at `path`.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb([40u8, 40u8, 40u8]));
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save test image");
}

/// Creates a temp runs directory with an empty `labels` subdirectory.
/// Returns the temp dir (keep alive) and the labels path.
pub fn create_runs_dir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let labels = dir.path().join("labels");
    std::fs::create_dir(&labels).expect("Failed to create labels directory");
    (dir, labels)
}

/// Writes one label file plus its matching image into a runs directory.
pub fn add_labeled_image(
    runs_dir: &Path,
    labels_dir: &Path,
    stem: &str,
    width: u32,
    height: u32,
    lines: &[&str],
) {
    write_test_image(&runs_dir.join(format!("{}.png", stem)), width, height);
    std::fs::write(
        labels_dir.join(format!("{}.txt", stem)),
        format!("{}\n", lines.join("\n")),
    )
    .expect("Failed to write label file");
}

/// Writes a class-names file (one name per line) and returns its path.
pub fn write_names_file(dir: &Path, names: &[&str]) -> PathBuf {
    let path = dir.join("classes.txt");
    std::fs::write(&path, format!("{}\n", names.join("\n"))).expect("Failed to write names file");
    path
}

/// Loads a ClassTable from a throwaway names file.
pub fn make_class_table(names: &[&str]) -> ClassTable {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_names_file(dir.path(), names);
    ClassTable::load(&path).expect("Failed to load class table")
}

/// Builds a DetectionRecord with a fixed centered geometry on 640x480.
pub fn make_detection(class_id: u32, class_name: Option<&str>, confidence: f32) -> DetectionRecord {
    let bbox_norm = NormBox {
        cx: 0.5,
        cy: 0.5,
        w: 0.2,
        h: 0.2,
    };
    DetectionRecord {
        class_id,
        class_name: class_name.map(String::from),
        confidence,
        bbox: bbox_norm.to_pixels(640, 480),
        bbox_norm,
    }
}

/// Builds a DetectionSet for a 640x480 image.
pub fn make_set(image: &str, detections: Vec<DetectionRecord>) -> DetectionSet {
    DetectionSet {
        image: image.to_string(),
        image_path: Some(image.to_string()),
        width: 640,
        height: 480,
        detections,
        meta: None,
    }
}

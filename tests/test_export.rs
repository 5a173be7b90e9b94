//! Integration tests for the exporter.
//!
//! Tests cover:
//! - Normalized-to-pixel conversion against hand-computed values
//! - bbox/bbox_norm round-trip consistency within one pixel
//! - Clamping of boxes that straddle image edges
//! - Per-image failure recording for malformed label files and missing images
//! - Labels directory resolution (default, nested, explicit override)
//! - Sorted output order, blank-line handling, relative paths
//! - Optional class-name pre-resolution
//! - Artifact wire format (JSON array, null class_name, no meta)

mod common;

use common::*;
use detsift::export::{Exporter, FailureKind};
use detsift::{read_artifact, write_artifact};

#[test]
fn test_pixel_conversion_formula() -> anyhow::Result<()> {
    // 1. One 1280x720 image with a single detection
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "street",
        1280,
        720,
        &["0 0.30 0.54 0.24 0.62 0.87"],
    );

    // 2. Export it
    let outcome = Exporter::new(runs.path()).run()?;
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.sets.len(), 1);

    let set = &outcome.sets[0];
    assert_eq!(set.image, "street.png");
    assert_eq!(set.width, 1280);
    assert_eq!(set.height, 720);
    assert_eq!(set.detections.len(), 1);

    // 3. Check x1=(cx-w/2)*W etc., rounded to the nearest pixel
    let detection = &set.detections[0];
    assert_eq!(detection.class_id, 0);
    assert_eq!(detection.bbox.x1, 230); // (0.30 - 0.12) * 1280 = 230.4
    assert_eq!(detection.bbox.y1, 166); // (0.54 - 0.31) * 720  = 165.6
    assert_eq!(detection.bbox.x2, 538); // (0.30 + 0.12) * 1280 = 537.6
    assert_eq!(detection.bbox.y2, 612); // (0.54 + 0.31) * 720  = 612.0
    assert!((detection.confidence - 0.87).abs() < 1e-6);
    assert!(detection.class_name.is_none());

    Ok(())
}

#[test]
fn test_bbox_round_trip_within_one_pixel() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "scene",
        1920,
        1080,
        &[
            "0 0.5 0.5 0.25 0.4 0.9",
            "3 0.11 0.72 0.08 0.13 0.51",
            "1 0.93 0.08 0.12 0.15 0.66",
        ],
    );

    let outcome = Exporter::new(runs.path()).run()?;
    let set = &outcome.sets[0];
    assert_eq!(set.detections.len(), 3);

    // Recomputing the pixel box from bbox_norm must agree within one pixel
    for detection in &set.detections {
        let recomputed = detection.bbox_norm.to_pixels(set.width, set.height);
        assert!((recomputed.x1 as i64 - detection.bbox.x1 as i64).abs() <= 1);
        assert!((recomputed.y1 as i64 - detection.bbox.y1 as i64).abs() <= 1);
        assert!((recomputed.x2 as i64 - detection.bbox.x2 as i64).abs() <= 1);
        assert!((recomputed.y2 as i64 - detection.bbox.y2 as i64).abs() <= 1);
        assert!(detection.bbox.x1 <= detection.bbox.x2);
        assert!(detection.bbox.y1 <= detection.bbox.y2);
    }

    Ok(())
}

#[test]
fn test_edge_boxes_clamped_to_image() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    // Both boxes extend past an image edge before clamping
    add_labeled_image(
        runs.path(),
        &labels,
        "border",
        100,
        100,
        &["0 0.05 0.5 0.2 0.4 0.9", "0 0.98 0.5 0.1 0.2 0.8"],
    );

    let outcome = Exporter::new(runs.path()).run()?;
    let set = &outcome.sets[0];

    let left = &set.detections[0].bbox;
    assert_eq!(left.x1, 0); // (0.05 - 0.10) * 100 = -5, clamped
    assert_eq!(left.x2, 15);

    let right = &set.detections[1].bbox;
    assert_eq!(right.x2, 100); // (0.98 + 0.05) * 100 = 103, clamped
    assert!(right.x1 <= right.x2);

    Ok(())
}

#[test]
fn test_malformed_file_skips_image_not_batch() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(runs.path(), &labels, "bad", 100, 100, &["0 0.5 0.5 0.2"]);
    add_labeled_image(
        runs.path(),
        &labels,
        "good",
        100,
        100,
        &["0 0.5 0.5 0.2 0.2 0.7"],
    );

    let outcome = Exporter::new(runs.path()).run()?;

    // 'bad' is skipped and recorded; 'good' still exported
    assert_eq!(outcome.sets.len(), 1);
    assert_eq!(outcome.sets[0].image, "good.png");
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].kind,
        FailureKind::MalformedLine { line: 1, .. }
    ));

    Ok(())
}

#[test]
fn test_non_numeric_and_out_of_range_fields_are_malformed() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "nonnum",
        100,
        100,
        &["0 0.5 abc 0.2 0.2 0.7"],
    );
    add_labeled_image(
        runs.path(),
        &labels,
        "overconf",
        100,
        100,
        &["0 0.5 0.5 0.2 0.2 1.5"],
    );
    add_labeled_image(
        runs.path(),
        &labels,
        "negsize",
        100,
        100,
        &["0 0.5 0.5 -0.2 0.2 0.7"],
    );

    let outcome = Exporter::new(runs.path()).run()?;
    assert!(outcome.sets.is_empty());
    assert_eq!(outcome.failures.len(), 3);
    for failure in &outcome.failures {
        assert!(matches!(failure.kind, FailureKind::MalformedLine { .. }));
    }

    Ok(())
}

#[test]
fn test_missing_image_recorded_and_batch_continues() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "present",
        64,
        64,
        &["0 0.5 0.5 0.5 0.5 0.9"],
    );
    // Label with no matching image anywhere in the runs dir
    std::fs::write(labels.join("orphan.txt"), "0 0.5 0.5 0.5 0.5 0.9\n")?;

    let outcome = Exporter::new(runs.path()).run()?;

    assert_eq!(outcome.sets.len(), 1);
    assert_eq!(outcome.sets[0].image, "present.png");
    assert_eq!(outcome.failures.len(), 1);
    match &outcome.failures[0].kind {
        FailureKind::ImageNotFound { stem } => assert_eq!(stem, "orphan"),
        other => panic!("expected ImageNotFound, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_unreadable_image_recorded() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    // A .png that is not a PNG
    std::fs::write(runs.path().join("broken.png"), b"not an image")?;
    std::fs::write(labels.join("broken.txt"), "0 0.5 0.5 0.5 0.5 0.9\n")?;

    let outcome = Exporter::new(runs.path()).run()?;
    assert!(outcome.sets.is_empty());
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].kind,
        FailureKind::ImageUnreadable { .. }
    ));

    Ok(())
}

#[test]
fn test_missing_runs_dir_is_fatal() {
    let result = Exporter::new("/nonexistent/runs").run();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Runs directory"));
}

#[test]
fn test_missing_labels_dir_is_fatal() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let result = Exporter::new(dir.path()).run();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("labels"));
    Ok(())
}

#[test]
fn test_nested_labels_dir_resolved() -> anyhow::Result<()> {
    // runs/exp1/labels with the image beside the labels dir, not in runs/
    let runs = tempfile::TempDir::new()?;
    let exp = runs.path().join("exp1");
    let labels = exp.join("labels");
    std::fs::create_dir_all(&labels)?;
    write_test_image(&exp.join("frame.png"), 64, 64);
    std::fs::write(labels.join("frame.txt"), "0 0.5 0.5 0.5 0.5 0.9\n")?;

    let outcome = Exporter::new(runs.path()).run()?;
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.sets.len(), 1);
    assert_eq!(outcome.sets[0].image, "frame.png");

    Ok(())
}

#[test]
fn test_explicit_labels_dir_override() -> anyhow::Result<()> {
    let runs = tempfile::TempDir::new()?;
    let elsewhere = tempfile::TempDir::new()?;
    write_test_image(&runs.path().join("pic.png"), 32, 32);
    std::fs::write(elsewhere.path().join("pic.txt"), "0 0.5 0.5 0.5 0.5 0.9\n")?;

    let outcome = Exporter::new(runs.path())
        .with_labels_dir(elsewhere.path())
        .run()?;
    assert_eq!(outcome.sets.len(), 1);
    assert_eq!(outcome.sets[0].image, "pic.png");

    Ok(())
}

#[test]
fn test_sorted_order_and_blank_lines() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "beta",
        64,
        64,
        &["0 0.5 0.5 0.2 0.2 0.9"],
    );
    add_labeled_image(
        runs.path(),
        &labels,
        "alpha",
        64,
        64,
        &["0 0.5 0.5 0.2 0.2 0.9", "", "1 0.4 0.4 0.1 0.1 0.8"],
    );

    let outcome = Exporter::new(runs.path()).run()?;

    // Label files are processed in sorted path order
    assert_eq!(outcome.sets.len(), 2);
    assert_eq!(outcome.sets[0].image, "alpha.png");
    assert_eq!(outcome.sets[1].image, "beta.png");

    // The blank line in alpha.txt is ignored, not malformed
    assert_eq!(outcome.sets[0].detections.len(), 2);

    Ok(())
}

#[test]
fn test_class_name_pre_resolution() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "people",
        64,
        64,
        &["0 0.5 0.5 0.2 0.2 0.9", "9 0.4 0.4 0.1 0.1 0.8"],
    );

    let outcome = Exporter::new(runs.path())
        .with_class_table(make_class_table(&["person", "car"]))
        .run()?;

    let set = &outcome.sets[0];
    assert_eq!(set.detections[0].class_name.as_deref(), Some("person"));
    // Unknown ids stay unresolved rather than failing the export
    assert!(set.detections[1].class_name.is_none());

    Ok(())
}

#[test]
fn test_relative_paths() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "shot",
        64,
        64,
        &["0 0.5 0.5 0.2 0.2 0.9"],
    );

    let outcome = Exporter::new(runs.path())
        .with_relative_paths(true)
        .run()?;
    assert_eq!(
        outcome.sets[0].image_path.as_deref(),
        Some("shot.png"),
        "image_path should be relative to the runs directory"
    );

    Ok(())
}

#[test]
fn test_artifact_wire_format() -> anyhow::Result<()> {
    let (runs, labels) = create_runs_dir();
    add_labeled_image(
        runs.path(),
        &labels,
        "wire",
        64,
        64,
        &["2 0.5 0.5 0.2 0.2 0.9"],
    );

    let outcome = Exporter::new(runs.path()).run()?;

    let dir = tempfile::TempDir::new()?;
    let artifact = dir.path().join("detections.json");
    write_artifact(&artifact, &outcome.sets)?;

    // 1. JSON array of image records; unresolved names serialize as null,
    //    exporter output carries no meta block
    let text = std::fs::read_to_string(&artifact)?;
    assert!(text.trim_start().starts_with('['));
    assert!(text.contains("\"class_name\": null"));
    assert!(!text.contains("\"meta\""));

    // 2. Reading it back yields the same sets
    let loaded = read_artifact(&artifact)?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].image, "wire.png");
    assert_eq!(loaded[0].detections.len(), 1);
    assert_eq!(loaded[0].detections[0].bbox, outcome.sets[0].detections[0].bbox);

    Ok(())
}

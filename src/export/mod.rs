pub mod locate;
pub mod parse;

use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::labels::ClassTable;
use crate::models::{DetectionRecord, DetectionSet};

/// Why one image's detections could not be exported.
#[derive(Debug)]
pub enum FailureKind {
    /// The label file could not be read at all.
    LabelUnreadable { reason: String },
    /// A label line failed to parse (1-based line number).
    MalformedLine { line: usize, reason: String },
    /// No image with the label's stem exists under the runs directory.
    ImageNotFound { stem: String },
    /// The image exists but its dimensions could not be read.
    ImageUnreadable { path: PathBuf, reason: String },
}

/// A recorded per-image failure. Failures never abort the batch; the image
/// is skipped and the failure reported.
#[derive(Debug)]
pub struct ExportFailure {
    pub label_path: PathBuf,
    pub kind: FailureKind,
}

impl std::fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = self.label_path.display();
        match &self.kind {
            FailureKind::LabelUnreadable { reason } => {
                write!(f, "Skipping {}: failed to read label file: {}", label, reason)
            }
            FailureKind::MalformedLine { line, reason } => {
                write!(f, "Skipping {}: malformed line {}: {}", label, line, reason)
            }
            FailureKind::ImageNotFound { stem } => {
                write!(f, "Skipping {}: image for label not found: {}", label, stem)
            }
            FailureKind::ImageUnreadable { path, reason } => {
                write!(
                    f,
                    "Skipping {}: failed to read image {}: {}",
                    label,
                    path.display(),
                    reason
                )
            }
        }
    }
}

/// Result of one export run: the exported sets plus every recorded failure.
#[derive(Debug, Default)]
pub struct ExportOutcome {
    pub sets: Vec<DetectionSet>,
    pub failures: Vec<ExportFailure>,
}

/// Converts a detector run's raw label output into pixel-space DetectionSets.
pub struct Exporter {
    pub runs_dir: PathBuf,
    pub labels_dir: Option<PathBuf>,
    pub class_table: Option<ClassTable>,
    pub relative_paths: bool,
    pub verbose: bool,
}

impl Exporter {
    pub fn new<P: Into<PathBuf>>(runs_dir: P) -> Self {
        Self {
            runs_dir: runs_dir.into(),
            labels_dir: None,
            class_table: None,
            relative_paths: false,
            verbose: false,
        }
    }

    /// Use an explicit labels directory instead of searching the runs dir.
    pub fn with_labels_dir<P: Into<PathBuf>>(mut self, labels_dir: P) -> Self {
        self.labels_dir = Some(labels_dir.into());
        self
    }

    /// Pre-resolve class names during export. Unknown ids stay unresolved.
    pub fn with_class_table(mut self, table: ClassTable) -> Self {
        self.class_table = Some(table);
        self
    }

    /// Store image paths relative to the runs directory.
    pub fn with_relative_paths(mut self, relative_paths: bool) -> Self {
        self.relative_paths = relative_paths;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Export every label file under the runs directory, in sorted order.
    ///
    /// Malformed label files and missing/unreadable images skip that image
    /// and record a failure; the rest of the batch continues. A missing runs
    /// or labels directory is fatal before any processing.
    pub fn run(&self) -> anyhow::Result<ExportOutcome> {
        if !self.runs_dir.is_dir() {
            anyhow::bail!("Runs directory not found: {}", self.runs_dir.display());
        }

        let labels_dir = locate::resolve_labels_dir(&self.runs_dir, self.labels_dir.as_deref())?;
        if self.verbose {
            println!("Using labels directory: {}", labels_dir.display());
        }

        let label_files = locate::collect_label_files(&labels_dir)?;
        if self.verbose {
            println!("Found {} label files", label_files.len());
        }

        let mut outcome = ExportOutcome::default();
        for label_path in label_files {
            match self.export_one(&label_path) {
                Ok(set) => {
                    if self.verbose {
                        println!("  {} - {} detections", set.image, set.detections.len());
                    }
                    outcome.sets.push(set);
                }
                Err(failure) => outcome.failures.push(failure),
            }
        }

        Ok(outcome)
    }

    fn export_one(&self, label_path: &Path) -> Result<DetectionSet, ExportFailure> {
        let fail = |kind| ExportFailure {
            label_path: label_path.to_path_buf(),
            kind,
        };

        let image_path = locate::find_image_for_label(&self.runs_dir, label_path).map_err(|_| {
            fail(FailureKind::ImageNotFound {
                stem: label_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
        })?;

        let (width, height) = read_dimensions(&image_path).map_err(|err| {
            fail(FailureKind::ImageUnreadable {
                path: image_path.clone(),
                reason: err.to_string(),
            })
        })?;

        let text = std::fs::read_to_string(label_path).map_err(|err| {
            fail(FailureKind::LabelUnreadable {
                reason: err.to_string(),
            })
        })?;

        let mut detections = Vec::new();
        for (index, raw_line) in text.lines().enumerate() {
            if raw_line.trim().is_empty() {
                continue;
            }
            // Any bad line poisons the whole image
            let line = parse::parse_label_line(raw_line).map_err(|err| {
                fail(FailureKind::MalformedLine {
                    line: index + 1,
                    reason: err.to_string(),
                })
            })?;

            let class_name = self
                .class_table
                .as_ref()
                .and_then(|table| table.lookup(line.class_id))
                .map(String::from);

            detections.push(DetectionRecord {
                class_id: line.class_id,
                class_name,
                confidence: line.confidence,
                bbox: line.bbox_norm.to_pixels(width, height),
                bbox_norm: line.bbox_norm,
            });
        }

        let stored_path = if self.relative_paths {
            image_path
                .strip_prefix(&self.runs_dir)
                .unwrap_or(&image_path)
                .to_path_buf()
        } else {
            image_path.clone()
        };

        Ok(DetectionSet {
            image: image_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            image_path: Some(stored_path.to_string_lossy().into_owned()),
            width,
            height,
            detections,
            meta: None,
        })
    }
}

fn read_dimensions(path: &Path) -> anyhow::Result<(u32, u32)> {
    let dimensions = ImageReader::open(path)?.into_dimensions()?;
    Ok(dimensions)
}

use std::collections::BTreeMap;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::models::DetectionSet;

/// Metric used to order summary rows, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    NumDetections,
    MeanConfidence,
    MaxConfidence,
}

/// Statistics for one class across a whole artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    /// Resolved class name, or `class_<id>` when unresolved.
    pub class_display: String,
    pub class_id: u32,
    pub num_detections: usize,
    pub mean_confidence: f32,
    pub max_confidence: f32,
}

/// Aggregate per-class counts and confidence statistics in a single pass.
///
/// Classes are keyed by (display name, class id); rows come back sorted
/// descending by `sort_by`, with ties broken by lexical key order.
pub fn summarize(sets: &[DetectionSet], sort_by: SortBy) -> Vec<ClassSummary> {
    // BTreeMap keys give the deterministic lexical tie order for free.
    let mut groups: BTreeMap<(String, u32), (usize, f32, f32)> = BTreeMap::new();

    for set in sets {
        for detection in &set.detections {
            let display = detection
                .class_name
                .clone()
                .unwrap_or_else(|| format!("class_{}", detection.class_id));

            let (count, sum, max) = groups
                .entry((display, detection.class_id))
                .or_insert((0, 0.0, 0.0));
            *count += 1;
            *sum += detection.confidence;
            *max = max.max(detection.confidence);
        }
    }

    let mut rows: Vec<ClassSummary> = groups
        .into_iter()
        .map(|((class_display, class_id), (count, sum, max))| ClassSummary {
            class_display,
            class_id,
            num_detections: count,
            mean_confidence: sum / count as f32,
            max_confidence: max,
        })
        .collect();

    // Stable sort keeps the lexical order within equal metric values.
    rows.sort_by(|a, b| match sort_by {
        SortBy::NumDetections => b.num_detections.cmp(&a.num_detections),
        SortBy::MeanConfidence => b.mean_confidence.total_cmp(&a.mean_confidence),
        SortBy::MaxConfidence => b.max_confidence.total_cmp(&a.max_confidence),
    });

    rows
}

const COLUMNS: [&str; 5] = [
    "class_display",
    "class_id",
    "num_detections",
    "mean_confidence",
    "max_confidence",
];

fn row_cells(row: &ClassSummary) -> [String; 5] {
    [
        row.class_display.clone(),
        row.class_id.to_string(),
        row.num_detections.to_string(),
        format!("{:.3}", row.mean_confidence),
        format!("{:.3}", row.max_confidence),
    ]
}

/// Render rows as an aligned table, confidences at 3 decimal places.
pub fn format_table(rows: &[ClassSummary]) -> String {
    let table_rows: Vec<[String; 5]> = rows.iter().map(row_cells).collect();

    let mut widths: [usize; 5] = COLUMNS.map(str::len);
    for row in &table_rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render = |cells: &[String; 5]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>w$}", cell, w = *width))
            .collect::<Vec<String>>()
            .join(" ")
    };

    let header = COLUMNS.map(String::from);
    let mut out = render(&header);
    out.push('\n');
    for row in &table_rows {
        out.push_str(&render(row));
        out.push('\n');
    }
    out
}

/// Write rows to `.csv` or `.json`, chosen by the output extension. Any
/// other extension is a configuration error.
pub fn write_summary(rows: &[ClassSummary], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("csv") => {
            let mut out = String::from(
                "class_display,class_id,num_detections,mean_confidence,max_confidence\n",
            );
            for row in rows {
                out.push_str(&format!(
                    "{},{},{},{},{}\n",
                    row.class_display,
                    row.class_id,
                    row.num_detections,
                    row.mean_confidence,
                    row.max_confidence
                ));
            }
            std::fs::write(path, out)?;
        }
        Some("json") => {
            std::fs::write(path, serde_json::to_string_pretty(rows)?)?;
        }
        _ => anyhow::bail!("Unsupported output format; use .csv or .json"),
    }

    Ok(())
}

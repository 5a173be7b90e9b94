pub mod filters;

use std::collections::HashSet;

use crate::labels::ClassTable;
use crate::models::{DetectionSet, RefineMeta};

/// Case-insensitive set of class names the refiner keeps when class
/// filtering is requested.
#[derive(Debug, Clone)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    /// Parse a comma-separated name list. A list that was explicitly given
    /// but parses to nothing is a configuration error, not a no-op.
    pub fn parse(spec: &str) -> anyhow::Result<Self> {
        let names: HashSet<String> = spec
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .collect();

        if names.is_empty() {
            anyhow::bail!("Class filter given but contains no names: '{}'", spec);
        }

        Ok(Self { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Names in sorted order, as recorded in output meta blocks.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

/// Per-stage removal counts for one refine run, for downstream reporting.
#[derive(Debug, Default, Clone)]
pub struct RefineReport {
    pub images_in: usize,
    pub images_out: usize,
    pub detections_in: usize,
    pub detections_out: usize,
    pub dropped_confidence: usize,
    pub dropped_class: usize,
    /// Records whose class id had no entry in the table.
    pub unresolved_names: usize,
    /// Unresolved-name records the class filter discarded.
    pub dropped_unresolved: usize,
}

/// Filters exported DetectionSets by confidence and class.
///
/// Name resolution is mandatory: a refiner cannot be built without a class
/// table, and every record is re-resolved against it before filtering.
pub struct Refiner {
    pub table: ClassTable,
    pub min_conf: f32,
    pub allow_list: Option<AllowList>,
    pub drop_empty: bool,
    pub sort_desc: bool,
    pub verbose: bool,
}

impl Refiner {
    /// Build a refiner. Thresholds outside [0, 1] are rejected before any
    /// processing begins.
    pub fn new(table: ClassTable, min_conf: f32) -> anyhow::Result<Self> {
        if !(0.0..=1.0).contains(&min_conf) {
            anyhow::bail!(
                "Confidence threshold must be within [0, 1], got {}",
                min_conf
            );
        }
        Ok(Self {
            table,
            min_conf,
            allow_list: None,
            drop_empty: false,
            sort_desc: false,
            verbose: false,
        })
    }

    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    /// Omit images with zero surviving detections.
    pub fn with_drop_empty(mut self, drop_empty: bool) -> Self {
        self.drop_empty = drop_empty;
        self
    }

    /// Stable-sort survivors by confidence descending. The default keeps the
    /// detector's emission order.
    pub fn with_sort_desc(mut self, sort_desc: bool) -> Self {
        self.sort_desc = sort_desc;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Refine a batch of DetectionSets.
    ///
    /// Survivors keep their geometry and relative order; each output record
    /// carries a meta block describing what was applied.
    pub fn run(&self, sets: Vec<DetectionSet>) -> (Vec<DetectionSet>, RefineReport) {
        let mut report = RefineReport {
            images_in: sets.len(),
            ..RefineReport::default()
        };

        if self.verbose {
            println!("Refining {} images...", sets.len());
        }

        let mut refined = Vec::with_capacity(sets.len());
        for set in sets {
            let num_original = set.detections.len();
            report.detections_in += num_original;

            let mut detections = set.detections;
            report.unresolved_names += filters::resolve_names(&mut detections, &self.table);
            report.dropped_confidence += filters::filter_confidence(&mut detections, self.min_conf);
            if let Some(allow_list) = &self.allow_list {
                let (dropped, dropped_unresolved) =
                    filters::filter_classes(&mut detections, allow_list);
                report.dropped_class += dropped;
                report.dropped_unresolved += dropped_unresolved;
            }

            if self.sort_desc {
                detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            }

            if self.verbose {
                println!(
                    "  {}: {} of {} detections kept",
                    set.image,
                    detections.len(),
                    num_original
                );
            }

            if self.drop_empty && detections.is_empty() {
                continue;
            }

            report.detections_out += detections.len();

            let meta = RefineMeta {
                num_detections: detections.len(),
                num_original,
                min_conf_applied: self.min_conf,
                class_filter: self.allow_list.as_ref().map(AllowList::sorted_names),
            };

            refined.push(DetectionSet {
                image: set.image,
                image_path: set.image_path,
                width: set.width,
                height: set.height,
                detections,
                meta: Some(meta),
            });
        }

        report.images_out = refined.len();
        (refined, report)
    }
}

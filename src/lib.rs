pub mod annotate;
pub mod export;
pub mod labels;
pub mod models;
pub mod refine;
pub mod summary;

pub use annotate::Annotator;
pub use export::{ExportFailure, ExportOutcome, Exporter, FailureKind};
pub use labels::ClassTable;
pub use models::{
    DetectionRecord, DetectionSet, NormBox, PixelBox, RefineMeta, read_artifact, write_artifact,
};
pub use refine::{AllowList, RefineReport, Refiner};
pub use summary::{ClassSummary, SortBy, summarize};

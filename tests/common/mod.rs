#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from detsift for tests
pub use detsift::labels::ClassTable;
pub use detsift::models::{DetectionRecord, DetectionSet, NormBox, PixelBox, RefineMeta};

use crate::labels::ClassTable;
use crate::models::DetectionRecord;
use crate::refine::AllowList;

/// Resolve every record's class name against the table, overwriting whatever
/// the exporter stored. Records whose id has no entry keep `None` — name
/// resolution and filtering are independent concerns. Returns how many
/// records stayed unresolved.
pub fn resolve_names(detections: &mut [DetectionRecord], table: &ClassTable) -> usize {
    let mut unresolved = 0;
    for detection in detections.iter_mut() {
        detection.class_name = table.lookup(detection.class_id).map(String::from);
        if detection.class_name.is_none() {
            unresolved += 1;
        }
    }
    unresolved
}

/// Keep detections with `confidence >= threshold`. Returns the drop count.
pub fn filter_confidence(detections: &mut Vec<DetectionRecord>, threshold: f32) -> usize {
    let before = detections.len();
    detections.retain(|detection| detection.confidence >= threshold);
    before - detections.len()
}

/// Keep detections whose resolved name is on the allow-list. A record with
/// an unresolved name can never match a name-based list and is always
/// dropped here. Returns (dropped, dropped_unresolved).
pub fn filter_classes(
    detections: &mut Vec<DetectionRecord>,
    allow_list: &AllowList,
) -> (usize, usize) {
    let before = detections.len();
    let mut dropped_unresolved = 0;

    detections.retain(|detection| match &detection.class_name {
        Some(name) => allow_list.contains(name),
        None => {
            dropped_unresolved += 1;
            false
        }
    });

    (before - detections.len(), dropped_unresolved)
}

use crate::models::NormBox;

/// One parsed label line: `class_id cx cy w h confidence`.
#[derive(Debug, Clone, Copy)]
pub struct LabelLine {
    pub class_id: u32,
    pub bbox_norm: NormBox,
    pub confidence: f32,
}

/// Parse a single detector output line.
///
/// Exactly six space-separated fields are required. Geometry fields must be
/// finite, `w`/`h` non-negative, and `confidence` within [0, 1]. `cx`/`cy`
/// are not range-checked: boxes straddling an image edge are legal and get
/// clamped during pixel conversion.
pub fn parse_label_line(line: &str) -> anyhow::Result<LabelLine> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 6 {
        anyhow::bail!(
            "expected 6 fields (class cx cy w h conf), got {}",
            fields.len()
        );
    }

    let class_id: u32 = fields[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("class id is not a non-negative integer: '{}'", fields[0]))?;

    let mut values = [0.0f32; 5];
    for (slot, field) in values.iter_mut().zip(&fields[1..]) {
        let value: f32 = field
            .parse()
            .map_err(|_| anyhow::anyhow!("non-numeric field: '{}'", field))?;
        if !value.is_finite() {
            anyhow::bail!("non-finite field: '{}'", field);
        }
        *slot = value;
    }
    let [cx, cy, w, h, confidence] = values;

    if w < 0.0 || h < 0.0 {
        anyhow::bail!("box size must be non-negative, got w={} h={}", w, h);
    }
    if !(0.0..=1.0).contains(&confidence) {
        anyhow::bail!("confidence {} outside [0, 1]", confidence);
    }

    Ok(LabelLine {
        class_id,
        bbox_norm: NormBox { cx, cy, w, h },
        confidence,
    })
}

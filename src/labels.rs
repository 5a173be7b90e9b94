use std::path::Path;

use anyhow::Context;

/// Class-name table owned by the detector's model artifact.
///
/// Loaded from a plain-text names file: one name per line, a name's index is
/// its position among non-blank lines. The table is model-specific and never
/// hard-coded here.
#[derive(Debug, Clone)]
pub struct ClassTable {
    names: Vec<String>,
}

impl ClassTable {
    /// Load a names file. A missing or empty file is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Class names file not found: {}", path.display()))?;

        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() {
            anyhow::bail!("Class names file is empty: {}", path.display());
        }

        Ok(Self { names })
    }

    /// Resolve a class id to its name, if the table has an entry for it.
    pub fn lookup(&self, class_id: u32) -> Option<&str> {
        self.names.get(class_id as usize).map(String::as_str)
    }

    pub fn has(&self, class_id: u32) -> bool {
        (class_id as usize) < self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

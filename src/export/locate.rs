use std::path::{Path, PathBuf};

/// Extensions probed when matching an image file to a label stem.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Resolve the labels directory for a run: an explicit override, else
/// `<runs-dir>/labels`, else the first `labels` directory found by a
/// recursive search in sorted order.
pub fn resolve_labels_dir(runs_dir: &Path, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = override_dir {
        if !dir.is_dir() {
            anyhow::bail!("Labels directory not found: {}", dir.display());
        }
        return Ok(dir.to_path_buf());
    }

    let candidate = runs_dir.join("labels");
    if candidate.is_dir() {
        return Ok(candidate);
    }

    if let Some(found) = find_dir_named(runs_dir, "labels")? {
        return Ok(found);
    }

    anyhow::bail!(
        "Could not locate a 'labels' directory under {}",
        runs_dir.display()
    )
}

/// Find the image a label file belongs to, by shared file stem.
///
/// Probes the runs directory and the labels directory's parent for
/// `<stem>.<ext>` over the known extensions, then falls back to a recursive
/// search. Traversal is sorted, so the first match is deterministic.
pub fn find_image_for_label(runs_dir: &Path, label_path: &Path) -> anyhow::Result<PathBuf> {
    let stem = label_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            anyhow::anyhow!("Label file has no usable stem: {}", label_path.display())
        })?;

    let mut probe_dirs: Vec<&Path> = vec![runs_dir];
    let in_labels_dir = label_path
        .parent()
        .is_some_and(|p| p.file_name().is_some_and(|n| n == "labels"));
    if in_labels_dir {
        if let Some(base) = label_path.parent().and_then(Path::parent) {
            if base != runs_dir {
                probe_dirs.push(base);
            }
        }
    }

    for dir in probe_dirs {
        for ext in IMAGE_EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", stem, ext));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    if let Some(found) = find_image_recursive(runs_dir, stem)? {
        return Ok(found);
    }

    anyhow::bail!("Image for label not found: {}", stem)
}

/// All `.txt` files under the labels directory, in sorted path order.
pub fn collect_label_files(labels_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_txt_files(labels_dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_txt_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_txt_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            out.push(path);
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}

fn find_dir_named(root: &Path, name: &str) -> anyhow::Result<Option<PathBuf>> {
    let subdirs: Vec<PathBuf> = sorted_entries(root)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect();

    // Shallower matches win
    for dir in &subdirs {
        if dir.file_name().is_some_and(|n| n == name) {
            return Ok(Some(dir.clone()));
        }
    }
    for dir in subdirs {
        if let Some(found) = find_dir_named(&dir, name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn find_image_recursive(root: &Path, stem: &str) -> anyhow::Result<Option<PathBuf>> {
    let entries = sorted_entries(root)?;

    for path in &entries {
        if path.is_file() && path.file_stem().is_some_and(|s| s == stem) && is_image_file(path) {
            return Ok(Some(path.clone()));
        }
    }
    for path in entries {
        if path.is_dir() {
            if let Some(found) = find_image_recursive(&path, stem)? {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

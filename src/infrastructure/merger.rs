//! Selective Patch Merger.
//!
//! Walks the staging tree and overwrites only predicate-matching files at
//! the same relative path under the destination. Everything the engine
//! re-printed but the predicate rejects stays exactly as the mirror wrote
//! it; this is what keeps non-target files byte-identical to the original.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::conventions::is_target_file;
use crate::ports::PatchMerger;

pub struct SuffixPatchMerger;

impl PatchMerger for SuffixPatchMerger {
    fn merge(&self, staging_root: &Path, dest_root: &Path) -> Result<Vec<PathBuf>> {
        merge_with(staging_root, dest_root, &is_target_file)
    }
}

/// Merge with an arbitrary relative-path predicate. The default suffix
/// predicate is just one policy; which files count as targets is not baked
/// into the mechanism.
pub fn merge_with(
    staging_root: &Path,
    dest_root: &Path,
    predicate: &dyn Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    let mut patched = Vec::new();
    walk(staging_root, staging_root, dest_root, predicate, &mut patched)?;
    patched.sort();
    Ok(patched)
}

fn walk(
    dir: &Path,
    staging_root: &Path,
    dest_root: &Path,
    predicate: &dyn Fn(&Path) -> bool,
    patched: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, staging_root, dest_root, predicate, patched)?;
            continue;
        }

        let rel = path
            .strip_prefix(staging_root)
            .context("Staged file outside the staging root")?;
        if !predicate(rel) {
            continue;
        }

        let dest = dest_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::copy(&path, &dest)
            .with_context(|| format!("Failed to patch file: {}", dest.display()))?;
        patched.push(rel.to_path_buf());
    }
    Ok(())
}

//! Tree Mirror.
//!
//! Recursively copies the original project to the destination, skipping the
//! excluded subtrees (`.git`, `target`, stale staging). A pre-existing
//! destination is deleted in full first so no files survive from a previous
//! run. Any I/O error is fatal and names the offending path.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::conventions::MIRROR_EXCLUSIONS;
use crate::ports::ProjectMirror;

pub struct FsTreeMirror;

impl ProjectMirror for FsTreeMirror {
    fn mirror(&self, source_root: &Path, dest_root: &Path) -> Result<()> {
        if dest_root.exists() {
            fs::remove_dir_all(dest_root).with_context(|| {
                format!("Failed to delete existing destination: {}", dest_root.display())
            })?;
        }
        fs::create_dir_all(dest_root)
            .with_context(|| format!("Failed to create destination: {}", dest_root.display()))?;
        copy_dir(source_root, dest_root, source_root)
    }
}

/// Is this path, relative to the source root, inside an excluded subtree?
fn is_excluded(source_root: &Path, path: &Path) -> bool {
    let rel = match path.strip_prefix(source_root) {
        Ok(rel) => rel,
        Err(_) => return false,
    };
    let rel_str = rel.to_string_lossy().replace('\\', "/");
    MIRROR_EXCLUSIONS
        .iter()
        .any(|ex| rel_str == *ex || rel_str.starts_with(&format!("{ex}/")))
}

fn copy_dir(dir: &Path, dest: &Path, source_root: &Path) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", dir.display()))?;
        let path = entry.path();
        if is_excluded(source_root, &path) {
            continue;
        }

        // file_type() does not follow links: a symlink to an ancestor must
        // not recurse, and links are not materialized as full copies.
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat entry: {}", path.display()))?;
        if file_type.is_symlink() {
            println!("[mirror] skipping symlink: {}", path.display());
            continue;
        }

        let target = dest.join(entry.file_name());
        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            copy_dir(&path, &target, source_root)?;
        } else {
            // fs::copy carries permission bits along with the bytes.
            fs::copy(&path, &target)
                .with_context(|| format!("Failed to copy file: {}", path.display()))?;
        }
    }
    Ok(())
}

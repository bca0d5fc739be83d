//! Staging area lifecycle.
//!
//! The engine never writes into the destination directly; it serializes into
//! a staging tree inside the destination, which the merger reads and the
//! orchestrator discards. Removal happens on drop, so the tree is cleaned up
//! on the failure path as well as on success.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::conventions::STAGING_DIR_NAME;

pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Create a fresh staging tree under the destination, replacing any
    /// leftover from an aborted earlier run.
    pub fn create(dest_root: &Path) -> Result<Self> {
        let root = dest_root.join(STAGING_DIR_NAME);
        if root.exists() {
            fs::remove_dir_all(&root).with_context(|| {
                format!("Failed to remove stale staging tree: {}", root.display())
            })?;
        }
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create staging tree: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        // Cleanup failure must not mask the run's own error.
        let _ = fs::remove_dir_all(&self.root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_staging_removed_on_drop() {
        let dir = tempdir().unwrap();
        let root = {
            let staging = StagingArea::create(dir.path()).unwrap();
            fs::write(staging.root().join("unit.rs"), "fn x() {}\n").unwrap();
            assert!(staging.root().exists());
            staging.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_stale_staging_replaced() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join(STAGING_DIR_NAME).join("old.rs");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "stale\n").unwrap();

        let staging = StagingArea::create(dir.path()).unwrap();
        assert!(!stale.exists());
        assert!(staging.root().exists());
    }
}

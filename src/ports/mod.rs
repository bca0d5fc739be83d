use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::domain::injector::MethodRecord;

/// What the engine did in one run, serializable for the `--report` flag.
#[derive(Debug, Default, Serialize)]
pub struct EngineReport {
    pub units_parsed: usize,
    pub methods: Vec<MethodRecord>,
}

pub trait ProjectMirror {
    fn mirror(&self, source_root: &Path, dest_root: &Path) -> Result<()>;
}

pub trait InstrumentationEngine {
    fn run(&self, source_subtree: &Path, staging_subtree: &Path) -> Result<EngineReport>;
}

pub trait PatchMerger {
    /// Returns the relative paths of the patched files.
    fn merge(&self, staging_root: &Path, dest_root: &Path) -> Result<Vec<PathBuf>>;
}

pub trait ConfigAugmenter {
    fn augment(&self, dest_root: &Path) -> Result<()>;
}

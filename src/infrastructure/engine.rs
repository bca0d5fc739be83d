//! Filesystem adapter for the instrumentation engine.
//!
//! Walks the designated subtree of the *original* project, runs the injector
//! over every `.rs` unit, and serializes every unit (modified or not) into
//! the staging tree at the same relative path. The destination is never read
//! here; only the merger touches it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::injector::instrument_unit;
use crate::ports::{EngineReport, InstrumentationEngine};

pub struct SynInstrumentationEngine;

impl InstrumentationEngine for SynInstrumentationEngine {
    fn run(&self, source_subtree: &Path, staging_subtree: &Path) -> Result<EngineReport> {
        fs::create_dir_all(staging_subtree).with_context(|| {
            format!("Failed to create staging subtree: {}", staging_subtree.display())
        })?;

        let mut units = Vec::new();
        collect_rs_files(source_subtree, &mut units)?;
        units.sort();

        let mut report = EngineReport::default();
        for unit in &units {
            let rel = unit
                .strip_prefix(source_subtree)
                .context("Source unit outside the designated subtree")?;
            let src = fs::read_to_string(unit)
                .with_context(|| format!("Failed to read source unit: {}", unit.display()))?;

            let (out, records) = instrument_unit(&rel.display().to_string(), &src)?;
            report.units_parsed += 1;
            report.methods.extend(records);

            let staged = staging_subtree.join(rel);
            if let Some(parent) = staged.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create staging directory: {}", parent.display())
                })?;
            }
            fs::write(&staged, out)
                .with_context(|| format!("Failed to write staged unit: {}", staged.display()))?;
        }

        Ok(report)
    }
}

fn collect_rs_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out)?;
        } else if path.extension().map(|ext| ext == "rs").unwrap_or(false) {
            out.push(path);
        }
    }
    Ok(())
}

//! Pipeline orchestration.
//!
//! Sequences the stages strictly: mirror, engine into staging, selective
//! merge, config augmentation. Each stage finishes all of its writes before
//! the next begins; the engine only ever reads the original project. The
//! staging tree is removed on both success and failure (drop guard).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::domain::conventions::SERVICES_SUBTREE;
use crate::infrastructure::StagingArea;
use crate::ports::{ConfigAugmenter, EngineReport, InstrumentationEngine, PatchMerger, ProjectMirror};

/// Summary of a completed run, serializable for the `--report` flag.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub original: PathBuf,
    pub destination: PathBuf,
    pub units_parsed: usize,
    pub patched_files: Vec<PathBuf>,
    pub methods: Vec<crate::domain::injector::MethodRecord>,
}

pub struct InstrumentUsecase<'a> {
    pub mirror: &'a dyn ProjectMirror,
    pub engine: &'a dyn InstrumentationEngine,
    pub merger: &'a dyn PatchMerger,
    pub augmenter: &'a dyn ConfigAugmenter,
}

impl<'a> InstrumentUsecase<'a> {
    /// Run the whole pipeline. Preconditions are checked before any mutation.
    pub fn run(&self, original: &Path, dest: &Path) -> Result<RunReport> {
        check_preconditions(original)?;

        println!("[mirror] {} -> {}", original.display(), dest.display());
        self.mirror
            .mirror(original, dest)
            .context("Tree mirror stage failed")?;

        let staging = StagingArea::create(dest)?;

        println!("[engine] instrumenting {}", original.join(SERVICES_SUBTREE).display());
        let engine_report: EngineReport = self
            .engine
            .run(
                &original.join(SERVICES_SUBTREE),
                &staging.root().join(SERVICES_SUBTREE),
            )
            .context("Instrumentation stage failed")?;
        println!(
            "[engine] {} units parsed, {} methods instrumented",
            engine_report.units_parsed,
            engine_report.methods.len()
        );

        println!("[merge] patching instrumented files into destination");
        let patched = self
            .merger
            .merge(&staging.root().join(SERVICES_SUBTREE), &dest.join(SERVICES_SUBTREE))
            .context("Merge stage failed")?;
        for rel in &patched {
            println!("  patched: {}", rel.display());
        }

        self.augmenter
            .augment(dest)
            .context("Config augmentation stage failed")?;

        drop(staging);

        println!("Done. Runnable instrumented project created at: {}", dest.display());
        println!("Try:");
        println!("  cd \"{}\"", dest.display());
        println!("  cargo build");
        println!("  cargo run");

        Ok(RunReport {
            original: original.to_path_buf(),
            destination: dest.to_path_buf(),
            units_parsed: engine_report.units_parsed,
            patched_files: patched,
            methods: engine_report.methods,
        })
    }
}

/// Both preconditions abort before any mutation: the manifest must exist and
/// parse as TOML, and the designated subtree must exist.
pub fn check_preconditions(original: &Path) -> Result<()> {
    let manifest_path = original.join("Cargo.toml");
    if !manifest_path.exists() {
        bail!("Cargo.toml not found in original project: {}", original.display());
    }
    let manifest = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
    manifest
        .parse::<toml::Table>()
        .with_context(|| format!("Manifest is not valid TOML: {}", manifest_path.display()))?;

    let services = original.join(SERVICES_SUBTREE);
    if !services.is_dir() {
        bail!(
            "{SERVICES_SUBTREE} not found in original project: {}",
            original.display()
        );
    }
    Ok(())
}

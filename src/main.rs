// Command-line entry point for Logprobe.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use logprobe::application::InstrumentUsecase;
use logprobe::infrastructure::{
    FsTreeMirror, ManifestAugmenter, SuffixPatchMerger, SynInstrumentationEngine,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the original project (must contain Cargo.toml and src/services)
    original: PathBuf,

    /// Root of the runnable instrumented copy to create
    dest: PathBuf,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let usecase = InstrumentUsecase {
        mirror: &FsTreeMirror,
        engine: &SynInstrumentationEngine,
        merger: &SuffixPatchMerger,
        augmenter: &ManifestAugmenter,
    };

    let report = usecase.run(&cli.original, &cli.dest)?;

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        println!("Report written to {}", report_path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

//! Batch command - scan many files and export one table per category.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use keihi_core::{Aggregation, DocumentCategory, ScannedDocument};

use crate::export::{self, ExportFormat};
use crate::manifest;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required_unless_present = "manifest", conflicts_with = "manifest")]
    input: Option<String>,

    /// Manifest file: a directory line followed by file-name prefixes
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Output directory (default: export.output_dir from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Export format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Concurrent field requests per file
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Write into a timestamped subdirectory of the output directory
    #[arg(long)]
    timestamp: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = super::load_config(config_path)?;
    if let Some(jobs) = args.jobs {
        config.extraction.concurrency = jobs;
    }

    let files = collect_files(&args)?;
    if files.is_empty() {
        anyhow::bail!("No files to scan");
    }

    println!(
        "{} Found {} files to scan",
        style("ℹ").blue(),
        files.len()
    );

    let scanner = super::build_scanner(&config)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut aggregation = Aggregation::new();
    let mut failures: Vec<(PathBuf, String)> = Vec::new();

    for path in files {
        match scanner.scan_file(&path).await {
            Ok(record) => aggregation.push(ScannedDocument::new(path, record)),
            Err(e) => {
                error!("Failed to scan {}: {}", path.display(), e);
                if args.fail_fast {
                    pb.abandon();
                    anyhow::bail!("Scanning failed: {}", e);
                }
                failures.push((path, e.to_string()));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    let output_dir = output_dir(&args, &config.export.output_dir);
    let written = export::write_aggregation(&aggregation, &output_dir, args.format)?;
    for path in &written {
        println!("{} Wrote {}", style("✓").green(), path.display());
    }

    if !failures.is_empty() {
        let report = export::write_failures(&output_dir, &failures)?;
        info!("Failure report written to {}", report.display());
    }

    print_summary(&aggregation, &failures);
    println!(
        "{} Scanned {} files in {:?}",
        style("✓").green(),
        aggregation.len() + failures.len(),
        start.elapsed()
    );

    Ok(())
}

fn collect_files(args: &BatchArgs) -> anyhow::Result<Vec<PathBuf>> {
    if let Some(manifest) = &args.manifest {
        return manifest::list_files(manifest);
    }

    let pattern = args.input.as_deref().unwrap_or_default();
    let files = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    Ok(files)
}

fn output_dir(args: &BatchArgs, configured: &Path) -> PathBuf {
    let base = args
        .output_dir
        .clone()
        .unwrap_or_else(|| configured.to_path_buf());

    if args.timestamp {
        base.join(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string())
    } else {
        base
    }
}

fn print_summary(aggregation: &Aggregation, failures: &[(PathBuf, String)]) {
    println!();
    for category in DocumentCategory::KNOWN
        .into_iter()
        .chain(std::iter::once(DocumentCategory::Unknown))
    {
        let count = aggregation.get(category).len();
        if count > 0 {
            println!("   {:<20} {}", category.label(), style(count).green());
        }
    }

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, error) in failures {
            println!("  - {}: {}", path.display(), error);
        }
    }
}

//! Scan command - classify and extract a single receipt or invoice.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use keihi_core::{DocumentCategory, ExtractionRecord, LoadError, ScannedDocument};

use crate::export;

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Input file (PNG, JPEG or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Only classify the document, skip field extraction
    #[arg(long)]
    classify_only: bool,

    /// Report suspicious extracted values
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV header and row
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Scanning file: {}", args.input.display());
    let scanner = super::build_scanner(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let output = if args.classify_only {
        pb.set_message("Classifying...");
        let category = match scanner.loader().load(&args.input) {
            Ok(file) => scanner.classifier().detect_category(&file).await?,
            Err(LoadError::UnsupportedFileType(_)) => DocumentCategory::Unknown,
            Err(e) => return Err(e.into()),
        };
        pb.finish_and_clear();
        format_category(category, args.format)?
    } else {
        pb.set_message("Classifying and extracting...");
        let record = scanner.scan_file(&args.input).await?;
        pb.finish_and_clear();

        if args.validate {
            let issues = record.validate();
            if !issues.is_empty() {
                eprintln!("{}", style("Validation issues:").yellow());
                for issue in &issues {
                    eprintln!("  - {}", issue);
                }
            }
        }

        format_record(&ScannedDocument::new(args.input.clone(), record), args.format)?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_category(category: DocumentCategory, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(&serde_json::json!({
            "category": category.slug(),
            "label": category.label(),
        }))?,
        OutputFormat::Csv => format!("category,label\n{},{}\n", category.slug(), category.label()),
        OutputFormat::Text => format!("Category: {} ({})", category.label(), category.slug()),
    })
}

fn format_record(document: &ScannedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(document)?),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(&document.record)),
    }
}

fn format_csv(document: &ScannedDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(export::header(document.category()))?;
    wtr.write_record(export::row(document))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ExtractionRecord) -> String {
    let category = record.category();
    let mut output = format!("Category: {} ({})\n", category.label(), category.slug());

    match record {
        ExtractionRecord::Unknown { filename } => {
            output.push_str(&format!("File: {}\n", filename));
        }
        _ => {
            for (field, value) in record.fields() {
                output.push_str(&format!("  {:<15} {}\n", field.key(), value));
            }
        }
    }

    output
}

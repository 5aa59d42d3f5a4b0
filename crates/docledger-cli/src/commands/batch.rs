//! Batch command - classify many documents with parallel workers.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use docledger_core::rules::format_cents;
use docledger_core::{DetectionProtocol, DocumentLoader, DocumentSpec, InputFormat};

use super::config::load_config;
use super::{format_spec, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern selecting the input files
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results and the detection protocol
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of classifying a single file.
struct FileResult {
    path: PathBuf,
    spec: Option<DocumentSpec>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && InputFormat::from_path(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to classify",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Contiguous chunks keep the results in input order.
    let loader = DocumentLoader::from_config(&config);
    let jobs = args.jobs.max(1);
    let chunk_size = files.len().div_ceil(jobs);
    let mut handles = Vec::with_capacity(jobs);
    for chunk in files.chunks(chunk_size) {
        let mut worker = loader.worker();
        let chunk = chunk.to_vec();
        let progress = progress.clone();
        let continue_on_error = args.continue_on_error;
        handles.push(tokio::task::spawn_blocking(move || {
            let results = classify_chunk(&mut worker, chunk, continue_on_error, &progress);
            (results, worker.take_protocol())
        }));
    }

    let mut results = Vec::with_capacity(files.len());
    let mut protocol = DetectionProtocol::new();
    for handle in handles {
        let (chunk_results, chunk_protocol) = handle.await?;
        results.extend(chunk_results);
        protocol.extend(chunk_protocol);
    }

    progress.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.spec.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(spec) = &result.spec {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));
                fs::write(&output_path, format_spec(spec, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }

        let protocol_path = output_dir.join("protocol.json");
        fs::write(&protocol_path, protocol.to_json()?)?;
        debug!("Wrote detection protocol to {}", protocol_path.display());
    }

    if !args.continue_on_error {
        if let Some(first) = failed.first() {
            error!(
                "Failed to classify {}: {}",
                first.path.display(),
                first.error.as_deref().unwrap_or("unknown error")
            );
            anyhow::bail!(
                "Classification failed for {}: {}",
                first.path.display(),
                first.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Classified {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Classify one worker's files. Without `continue_on_error` the worker
/// stops at its first failure.
fn classify_chunk(
    loader: &mut DocumentLoader,
    files: Vec<PathBuf>,
    continue_on_error: bool,
    progress: &ProgressBar,
) -> Vec<FileResult> {
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = loader.load(&path, None, None);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;
        progress.inc(1);

        match result {
            Ok(spec) => results.push(FileResult {
                path,
                spec: Some(spec),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                warn!("Failed to classify {}: {}", path.display(), e);
                results.push(FileResult {
                    path,
                    spec: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                });
                if !continue_on_error {
                    break;
                }
            }
        }
    }

    results
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "type",
        "year",
        "month",
        "amount",
        "suggested_filename",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let row: Vec<String> = match &result.spec {
            Some(spec) => vec![
                filename,
                "success".to_string(),
                spec.document_type().as_str().to_string(),
                spec.year().map(|y| y.to_string()).unwrap_or_default(),
                spec.month().map(|m| m.to_string()).unwrap_or_default(),
                spec.amount().map(format_cents).unwrap_or_default(),
                spec.suggested_filename().unwrap_or("").to_string(),
                result.processing_time_ms.to_string(),
                String::new(),
            ],
            None => vec![
                filename,
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                result.processing_time_ms.to_string(),
                result.error.clone().unwrap_or_default(),
            ],
        };
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

//! Classify command - classify a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use docledger_core::{DocumentLoader, InputFormat};

use super::config::load_config;
use super::{format_spec, OutputFormat};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input file (PDF, text or CFDI XML)
    #[arg(required = true)]
    input: PathBuf,

    /// Treat the input as this format instead of using the extension
    #[arg(long = "as", value_name = "FORMAT")]
    declared: Option<InputFormat>,

    /// Original file name, when the input is a temporary copy
    #[arg(long)]
    name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the detection protocol as JSON to this file
    #[arg(long)]
    protocol: Option<PathBuf>,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Classifying file: {}", args.input.display());

    let mut loader = DocumentLoader::from_config(&config);
    let result = loader.load(&args.input, args.declared, args.name.as_deref());

    // Written even when classification failed.
    if let Some(protocol_path) = &args.protocol {
        fs::write(protocol_path, loader.protocol().to_json()?)?;
        debug!("Wrote detection protocol to {}", protocol_path.display());
    }

    let spec = result?;
    let output = format_spec(&spec, args.format)?;

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

    debug!("Total classification time: {:?}", start.elapsed());

    Ok(())
}

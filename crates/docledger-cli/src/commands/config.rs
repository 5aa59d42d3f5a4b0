//! `docledger config`: inspect the effective configuration or write a new file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use tracing::debug;

use docledger_core::rules::validate_rfc;
use docledger_core::DocledgerConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as JSON
    Show,

    /// Write a configuration file with default values
    Init(InitArgs),

    /// Print one value, e.g. "pdf.converter" or "tables.own_rfcs.0"
    Get { key: String },

    /// Print which configuration file is in effect
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the file (defaults to the user config directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// RFC of the owner, may be repeated
    #[arg(long = "own-rfc", value_name = "RFC")]
    own_rfcs: Vec<String>,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

/// Where the effective configuration is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// File given with `--config`.
    Explicit(PathBuf),
    /// Per-user file under the platform config directory.
    User(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl ConfigSource {
    /// `--config` wins, then the per-user file if present.
    pub fn resolve(config_path: Option<&str>) -> anyhow::Result<Self> {
        if let Some(path) = config_path {
            let path = PathBuf::from(path);
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Self::Explicit(path));
        }

        let user = user_config_path();
        Ok(if user.is_file() { Self::User(user) } else { Self::Defaults })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::User(path) => Some(path),
            Self::Defaults => None,
        }
    }

    pub fn load(&self) -> anyhow::Result<DocledgerConfig> {
        match self.path() {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                DocledgerConfig::from_file(path)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
            None => Ok(DocledgerConfig::default()),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) => write!(f, "{} (--config)", path.display()),
            Self::User(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// `<config dir>/docledger/config.json`.
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docledger")
        .join("config.json")
}

/// Configuration used by every command.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocledgerConfig> {
    ConfigSource::resolve(config_path)?.load()
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let source = ConfigSource::resolve(config_path)?;
            let config = source.load()?;
            eprintln!("{} Using {}", style("ℹ").blue(), source);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Get { key } => {
            let config = serde_json::to_value(load_config(config_path)?)?;
            let value = lookup(&config, &key)
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigCommand::Path => show_path(&ConfigSource::resolve(config_path)?),
        ConfigCommand::Init(init) => init_config(init)?,
    }
    Ok(())
}

/// Dotted key lookup; numeric segments index into arrays.
fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(root, |value, segment| match value {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => value.get(segment),
    })
}

fn show_path(source: &ConfigSource) {
    match source.path() {
        Some(path) => {
            println!("Configuration file: {}", path.display());
            println!("Status: {}", style("in use").green());
        }
        None => {
            println!("Configuration file: {}", user_config_path().display());
            println!("Status: {}", style("not created").yellow());
            println!();
            println!("Run 'docledger config init' to create one.");
        }
    }
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let target = args.output.unwrap_or_else(user_config_path);
    if target.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            target.display()
        );
    }

    let mut config = DocledgerConfig::default();
    for rfc in args.own_rfcs {
        let rfc = rfc.trim().to_uppercase();
        if !validate_rfc(&rfc) {
            anyhow::bail!("Not a valid RFC: {}", rfc);
        }
        config.tables.own_rfcs.push(rfc);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(&target)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        target.display()
    );
    Ok(())
}

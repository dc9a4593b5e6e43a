//! tsa-cascade - command-line front end
//!
//! Reads a source text and its simplified version (inline or from files),
//! runs the cascade classifier and prints JSON on stdout. Logs go to stderr.
//!
//! Configuration: `--config`, then `TSA_CONFIG`, then
//! `<config_dir>/tsa/config.toml`, then built-in defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsa_cascade::CascadeClassifier;
use tsa_common::config::{load_config, write_toml_config, TomlConfig};

/// Command-line arguments for tsa-cascade
#[derive(Parser, Debug)]
#[command(name = "tsa-cascade")]
#[command(about = "Detect text-simplification strategies between a source and a simplified text")]
#[command(version)]
struct Args {
    /// Source text file
    #[arg(long, conflicts_with = "source")]
    source_file: Option<PathBuf>,

    /// Source text (inline)
    #[arg(long)]
    source: Option<String>,

    /// Simplified text file
    #[arg(long, conflicts_with = "target")]
    target_file: Option<PathBuf>,

    /// Simplified text (inline)
    #[arg(long)]
    target: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print only the adaptive thresholds
    #[arg(long, conflicts_with = "report")]
    thresholds_only: bool,

    /// Print the full cascade report instead of the strategy list
    #[arg(long)]
    report: bool,

    /// Legacy early-exit mode (prunes later tiers on strong evidence)
    #[arg(long)]
    fast: bool,

    /// Disable the embedding model (lexical similarity fallback)
    #[arg(long)]
    no_embeddings: bool,

    /// Disable the language pipeline (regex segmentation fallback)
    #[arg(long)]
    no_pipeline: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// Write a default configuration file to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Strategies,
    Thresholds,
    Report,
}

impl Args {
    fn output_mode(&self) -> OutputMode {
        if self.thresholds_only {
            OutputMode::Thresholds
        } else if self.report {
            OutputMode::Report
        } else {
            OutputMode::Strategies
        }
    }

    /// Apply command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut TomlConfig) {
        if self.fast {
            config.cascade.complete_analysis_mode = false;
        }
        if self.no_embeddings {
            config.models.embeddings = false;
        }
        if self.no_pipeline {
            config.models.language_pipeline = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        write_toml_config(&TomlConfig::default(), path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);

    // Initialize tracing (stderr keeps stdout clean for JSON)
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tsa_cascade={0},tsa_common={0}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting tsa-cascade {}", env!("CARGO_PKG_VERSION"));

    let source = read_text("source", args.source_file.as_deref(), args.source.as_deref()).await?;
    let target = read_text("target", args.target_file.as_deref(), args.target.as_deref()).await?;

    let classifier = Arc::new(CascadeClassifier::from_config(&config));
    let mode = args.output_mode();

    // Classification is synchronous CPU work
    let output = tokio::task::spawn_blocking(move || -> Result<serde_json::Value> {
        let value = match mode {
            OutputMode::Thresholds => {
                serde_json::to_value(classifier.calculate_adaptive_thresholds(&source, &target))?
            }
            OutputMode::Report => serde_json::to_value(classifier.analyze(&source, &target))?,
            OutputMode::Strategies => {
                serde_json::to_value(classifier.detect_strategies(&source, &target))?
            }
        };
        Ok(value)
    })
    .await
    .context("Classification task failed")??;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Text from a file or an inline argument
async fn read_text(label: &str, file: Option<&Path>, inline: Option<&str>) -> Result<String> {
    match (file, inline) {
        (Some(path), _) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {} file {}", label, path.display())),
        (None, Some(text)) => Ok(text.to_string()),
        (None, None) => bail!("--{0} or --{0}-file is required", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_text_prefers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Texto do arquivo.").unwrap();
        let text = read_text("source", Some(file.path()), Some("inline"))
            .await
            .unwrap();
        assert_eq!(text, "Texto do arquivo.");
    }

    #[tokio::test]
    async fn test_read_text_requires_input() {
        let err = read_text("target", None, None).await.unwrap_err();
        assert!(err.to_string().contains("--target"));
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["tsa-cascade", "--fast", "--no-embeddings", "--report"]);
        let mut config = TomlConfig::default();
        args.apply_overrides(&mut config);
        assert!(!config.cascade.complete_analysis_mode);
        assert!(!config.models.embeddings);
        assert!(config.models.language_pipeline);
        assert_eq!(args.output_mode(), OutputMode::Report);
    }
}

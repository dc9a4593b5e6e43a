//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a small TOML file. Every field has a built-in
//! default, so a missing file (or a missing section) never stops the caller.
//!
//! # Config file priority
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TSA_CONFIG`)
//! 3. Platform config directory (`<config_dir>/tsa/config.toml`)
//! 4. Built-in defaults (fallback, no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TSA_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Classification cascade settings
    #[serde(default)]
    pub cascade: CascadeSettings,

    /// Language model availability
    #[serde(default)]
    pub models: ModelSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Cascade execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeSettings {
    /// Run every tier regardless of early-exit signals
    ///
    /// Default: true (full-depth analysis, reproducible results)
    #[serde(default = "default_true")]
    pub complete_analysis_mode: bool,

    /// Raw confidence above which evidence counts toward early exit
    #[serde(default = "default_early_exit_confidence")]
    pub early_exit_confidence: f64,

    /// High-confidence evidence count that stops the cascade after macro
    #[serde(default = "default_macro_early_exit_count")]
    pub macro_early_exit_count: usize,

    /// High-confidence evidence count that stops the cascade after meso
    #[serde(default = "default_meso_early_exit_count")]
    pub meso_early_exit_count: usize,

    /// Maximum example snippets kept per evidence
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// Drop strategies whose unified confidence was rejected to zero
    #[serde(default = "default_true")]
    pub drop_rejected: bool,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            complete_analysis_mode: true,
            early_exit_confidence: default_early_exit_confidence(),
            macro_early_exit_count: default_macro_early_exit_count(),
            meso_early_exit_count: default_meso_early_exit_count(),
            max_examples: default_max_examples(),
            drop_rejected: true,
        }
    }
}

/// Which optional language models to load at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Load the rule-based sentence/token pipeline (regex fallback otherwise)
    #[serde(default = "default_true")]
    pub language_pipeline: bool,

    /// Load the text embedder (Jaccard overlap fallback otherwise)
    #[serde(default = "default_true")]
    pub embeddings: bool,

    /// Embedding vector dimensionality
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            language_pipeline: true,
            embeddings: true,
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_early_exit_confidence() -> f64 {
    0.95
}

fn default_macro_early_exit_count() -> usize {
    3
}

fn default_meso_early_exit_count() -> usize {
    5
}

fn default_max_examples() -> usize {
    3
}

fn default_embedding_dimensions() -> usize {
    512
}

/// Resolve which config file to read, if any
///
/// Returns `None` when neither the CLI, the environment nor the platform
/// config directory point at an existing file.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// Platform config file location (`~/.config/tsa/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tsa").join("config.toml"))
}

/// Load configuration from an explicit TOML file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .inspect_err(|_| warn!("Config file {} is not valid TOML", path.display()))?;
    validate(&config)?;
    Ok(config)
}

/// Resolve and load configuration, falling back to built-in defaults
///
/// An explicit CLI path must exist. A missing file named by `TSA_CONFIG` is
/// not an error (warning + defaults). A file that exists but cannot be
/// parsed always is.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = cli_arg {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file {} not found",
                path.display()
            )));
        }
    }

    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            debug!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = target.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, target)?;
    Ok(())
}

fn validate(config: &TomlConfig) -> Result<()> {
    let confidence = config.cascade.early_exit_confidence;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(Error::Config(format!(
            "cascade.early_exit_confidence must be within [0, 1], got {}",
            confidence
        )));
    }
    if config.models.embedding_dimensions == 0 {
        return Err(Error::Config(
            "models.embedding_dimensions must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

//! Configuration management
//!
//! Handles loading and saving `config.toml` from the gsz configuration
//! directory. Missing files yield defaults; saves are atomic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryConfig;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "GSZ_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Default number of objects fetched per batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default deflate level for archives
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 9;

/// Resolve the configuration directory
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|d| d.join("gsz"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Color handling for human output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// `[defaults]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub output: OutputFormat,
    pub color: ColorMode,
    pub progress: bool,
    /// Profile used when `--profile` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: OutputFormat::Human,
            color: ColorMode::Auto,
            progress: true,
            profile: None,
        }
    }
}

/// `[retry.read]` and `[retry.write]` sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub read: RetryConfig,
    pub write: RetryConfig,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            read: RetryConfig::for_reads(),
            write: RetryConfig::for_writes(),
        }
    }
}

/// `[zip]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipSettings {
    pub batch_size: usize,
    /// In-flight fetches per batch; defaults to the batch size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    pub compression_level: i64,
}

impl Default for ZipSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ZipSettings {
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(self.batch_size).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("zip.batch_size must be at least 1".into()));
        }
        if self.concurrency == Some(0) {
            return Err(Error::Config("zip.concurrency must be at least 1".into()));
        }
        if !(0..=9).contains(&self.compression_level) {
            return Err(Error::Config(format!(
                "zip.compression_level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
    pub retry: RetrySettings,
    pub zip: ZipSettings,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.retry.read.validate()?;
        self.retry.write.validate()?;
        self.zip.validate()
    }
}

/// Loads and saves `config.toml`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default configuration directory
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(config_dir()?))
    }

    /// Manager rooted at an explicit directory
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let content = toml::to_string_pretty(config)?;
        write_atomic(&self.path, &content)
    }
}

/// Write a file by renaming a sibling temp file over it
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

//! Project configuration module.
//!
//! Handles loading and validating the optional `ts.toml` that lives in the
//! stanza base directory. Every key has a stock default, so the file only
//! needs the keys it wants to override. Command-line flags are applied on top
//! of the loaded config by the binary.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "dist"       # Relative to the stanza base directory
//!
//! [build]
//! development = false       # Development flag handed to the element runtime
//!
//! [server]
//! interface = "127.0.0.1"
//! port = 8080               # Next free port is tried when taken
//! development = true
//! workers = 4               # Request handler threads (1-64)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the stanza base directory.
pub const CONFIG_FILE: &str = "ts.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `ts.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TsConfig {
    /// Output root, relative to the stanza base directory unless absolute.
    /// The collection is written to `<output_dir>/stanza`.
    pub output_dir: String,
    pub build: BuildConfig,
    pub server: ServerConfig,
}

impl Default for TsConfig {
    fn default() -> Self {
        Self {
            output_dir: "dist".to_string(),
            build: BuildConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl TsConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be non-zero".into(),
            ));
        }
        if !(1..=64).contains(&self.server.workers) {
            return Err(ConfigError::Validation(
                "server.workers must be 1-64".into(),
            ));
        }
        Ok(())
    }
}

/// One-shot build settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Value of the `development` flag in every embedded descriptor.
    pub development: bool,
}

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub interface: String,
    pub port: u16,
    pub development: bool,
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 8080,
            development: true,
            workers: 4,
        }
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Parse `ts.toml` text, rejecting unknown keys, and validate the result.
///
/// Keys the text leaves out take their stock defaults.
pub fn parse_config(text: &str) -> Result<TsConfig, ConfigError> {
    let config: TsConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `ts.toml` in the given directory.
///
/// Returns the stock defaults when the directory has no `ts.toml`.
pub fn load_config(dir: &Path) -> Result<TsConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(TsConfig::default());
    }
    parse_config(&fs::read_to_string(&config_path)?)
}

/// Returns a fully-commented stock `ts.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# ts Configuration
# =================
# Place this file in the stanza base directory as ts.toml.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Output root, relative to the stanza base directory.
# The stanza collection is written to <output_dir>/stanza.
output_dir = "dist"

# ---------------------------------------------------------------------------
# One-shot build (`ts build`)
# ---------------------------------------------------------------------------
[build]
# Value of the `development` flag embedded in each stanza page.
development = false

# ---------------------------------------------------------------------------
# Development server (`ts server`)
# ---------------------------------------------------------------------------
[server]
# Address to bind.
interface = "127.0.0.1"

# Port to bind. When taken, the next ports are tried.
port = 8080

# Value of the `development` flag used for builds and rebuilds.
development = true

# Number of request handler threads (1-64).
workers = 4
"##
}

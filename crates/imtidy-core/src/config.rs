//! Configuration for imtidy-core
//!
//! Centralized configuration for matching thresholds, source discovery,
//! output naming and review behavior. Every section has defaults, so a
//! configuration file only needs the values it changes:
//!
//! ```toml
//! [matching]
//! field_similarity = 0.85
//!
//! [sources]
//! extension = "ltx"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::MatchThresholds;
use crate::resolution::ResolutionPolicy;

/// File name of the user configuration inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Directory under the home directory holding user configuration
pub const CONFIG_DIR: &str = ".imtidy";

/// Cleanup configuration, loaded from TOML and overridden by CLI flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidyConfig {
    /// Duplicate detection thresholds
    pub matching: MatchThresholds,
    /// Source document discovery
    pub sources: SourcesConfig,
    /// Output file naming
    pub output: OutputConfig,
    /// Duplicate review behavior
    pub review: ResolutionPolicy,
}

/// Source document discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// File extension of source documents, without the dot
    pub extension: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            extension: "tex".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Appended to the bibliography file name to form the output path
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: ".new".to_string(),
        }
    }
}

impl TidyConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load `~/.imtidy/config.toml` if it exists, otherwise the defaults
    pub fn load_standard() -> Result<Self, ConfigError> {
        match Self::standard_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Location of the user configuration file
    pub fn standard_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_unit_range = |v: f64| v > 0.0 && v <= 1.0;

        if !in_unit_range(self.matching.field_similarity) {
            return Err(ConfigError::OutOfRange(
                "field_similarity must be in (0.0, 1.0]".to_string(),
            ));
        }

        if !in_unit_range(self.matching.field_overlap) {
            return Err(ConfigError::OutOfRange(
                "field_overlap must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.sources.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::MissingField("sources.extension".to_string()));
        }

        if self.output.suffix.is_empty() {
            return Err(ConfigError::MissingField("output.suffix".to_string()));
        }

        if self.output.suffix.contains(|c: char| c == '/' || c == '\\') {
            return Err(ConfigError::OutOfRange(
                "output.suffix must not contain path separators".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Required field is missing or empty
    #[error("Missing field: {0}")]
    MissingField(String),
    /// The configuration text is not valid TOML for this schema
    #[error("Invalid configuration: {0}")]
    Parse(String),
    /// The configuration file could not be read
    #[error("Cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
}

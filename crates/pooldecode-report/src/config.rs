//! # Decode Configuration
//!
//! TOML settings for a decoding deployment.
//!
//! ```toml
//! [decode]
//! algorithm = "COMP"
//! # include_estimates = true   # override; default follows the algorithm
//! verify_partition = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Purely combinatorial decoding. Produces no quantitative estimates.
pub const COMP_ALGORITHM: &str = "COMP";

/// Root configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfigFile {
    #[serde(default)]
    pub decode: DecodeConfig,
}

/// Decoding and reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Decoder algorithm name as understood by the external routine.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Force the estimates line on or off. `None` follows the algorithm.
    #[serde(default)]
    pub include_estimates: Option<bool>,

    /// Fail runs whose classification does not partition the sample range.
    #[serde(default = "default_true")]
    pub verify_partition: bool,
}

fn default_algorithm() -> String {
    COMP_ALGORITHM.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            include_estimates: None,
            verify_partition: true,
        }
    }
}

impl DecodeConfig {
    /// Config for a named algorithm with everything else default.
    pub fn for_algorithm(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Default::default()
        }
    }

    /// Whether the report carries the estimates line.
    ///
    /// Explicit override wins; otherwise every algorithm except COMP reports
    /// estimates.
    pub fn include_estimates(&self) -> bool {
        self.include_estimates
            .unwrap_or_else(|| self.algorithm != COMP_ALGORITHM)
    }

    /// Load `[decode]` from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse `[decode]` from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ReportConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if file.decode.algorithm.trim().is_empty() {
            return Err(ConfigError::Invalid("decode.algorithm must not be empty".to_string()));
        }
        Ok(file.decode)
    }
}

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

//! # Statement Distribution Configuration
//!
//! Loaded from TOML or from `QC_STMT_*` environment variables. Every field
//! has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! max_seconded_per_validator = 2
//! max_known_candidates_per_validator = 4
//! flood_multiplier = 2
//! dependency_race_policy = "drop"
//! max_retained_per_relay_parent = 1024
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::ContextLimits;

/// What happens to a `Valid`/`Invalid` that arrives before its `Seconded`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyRacePolicy {
    /// Drop permanently. The sender's later resend is not accepted either,
    /// since its knowledge is already marked.
    #[default]
    Drop,
    /// Buffer and replay once the `Seconded` is accepted.
    Retain,
}

impl FromStr for DependencyRacePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "retain" => Ok(Self::Retain),
            other => Err(ConfigError::Invalid(format!(
                "unknown dependency race policy: {other}"
            ))),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Statement distribution configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Distinct `Seconded` accepted per validator per relay-parent.
    pub max_seconded_per_validator: usize,
    /// Known candidates tracked per peer per validator.
    pub max_known_candidates_per_validator: usize,
    /// Flood bound is this times the validator set size.
    pub flood_multiplier: usize,
    pub dependency_race_policy: DependencyRacePolicy,
    pub max_retained_per_relay_parent: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            max_seconded_per_validator: 2,
            max_known_candidates_per_validator: 4,
            flood_multiplier: 2,
            dependency_race_policy: DependencyRacePolicy::Drop,
            max_retained_per_relay_parent: 1024,
        }
    }
}

impl DistributionConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_STMT_MAX_SECONDED` (default: 2)
    /// - `QC_STMT_MAX_KNOWN_CANDIDATES` (default: 4)
    /// - `QC_STMT_FLOOD_MULTIPLIER` (default: 2)
    /// - `QC_STMT_RACE_POLICY`: `drop` or `retain` (default: drop)
    /// - `QC_STMT_MAX_RETAINED` (default: 1024)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            max_seconded_per_validator: parse_env("QC_STMT_MAX_SECONDED")?
                .unwrap_or(defaults.max_seconded_per_validator),
            max_known_candidates_per_validator: parse_env("QC_STMT_MAX_KNOWN_CANDIDATES")?
                .unwrap_or(defaults.max_known_candidates_per_validator),
            flood_multiplier: parse_env("QC_STMT_FLOOD_MULTIPLIER")?
                .unwrap_or(defaults.flood_multiplier),
            dependency_race_policy: parse_env("QC_STMT_RACE_POLICY")?
                .unwrap_or(defaults.dependency_race_policy),
            max_retained_per_relay_parent: parse_env("QC_STMT_MAX_RETAINED")?
                .unwrap_or(defaults.max_retained_per_relay_parent),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_seconded_per_validator == 0 {
            return Err(ConfigError::Invalid(
                "max_seconded_per_validator must be at least 1".into(),
            ));
        }
        if self.max_known_candidates_per_validator < self.max_seconded_per_validator {
            return Err(ConfigError::Invalid(format!(
                "max_known_candidates_per_validator ({}) below max_seconded_per_validator ({})",
                self.max_known_candidates_per_validator, self.max_seconded_per_validator
            )));
        }
        if self.flood_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "flood_multiplier must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn context_limits(&self) -> ContextLimits {
        ContextLimits {
            max_seconded: self.max_seconded_per_validator,
            max_known_candidates: self.max_known_candidates_per_validator,
            flood_multiplier: self.flood_multiplier,
            max_retained: match self.dependency_race_policy {
                DependencyRacePolicy::Drop => 0,
                DependencyRacePolicy::Retain => self.max_retained_per_relay_parent,
            },
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("{key}={value}"))),
        Err(_) => Ok(None),
    }
}

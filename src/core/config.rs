//! Monitor configuration: the single record edited by the user and read at
//! the start of every check cycle.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration is invalid: {0}")]
    Invalid(String),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("target rate must be between 0 and 100")]
    InvalidRate,

    #[error("failed to persist configuration: {0}")]
    Storage(#[from] std::io::Error),
}

/// Comparison applied between the fetched rate and the target rate.
///
/// The wire labels are the long-form phrases the config file has always
/// used. Anything else fails deserialization; an unknown condition is a
/// configuration error, never a silent non-notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "greater than or equal to")]
    GreaterOrEqual,
    #[serde(rename = "less than or equal to")]
    LessOrEqual,
}

impl Condition {
    /// Pure, total evaluation. Equality satisfies both conditions.
    pub fn is_met(self, current: f64, target: f64) -> bool {
        match self {
            Condition::GreaterOrEqual => current >= target,
            Condition::LessOrEqual => current <= target,
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Condition::GreaterOrEqual => "greater than or equal to",
                Condition::LessOrEqual => "less than or equal to",
            }
        )
    }
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greater than or equal to" | "gte" | ">=" => Ok(Condition::GreaterOrEqual),
            "less than or equal to" | "lte" | "<=" => Ok(Condition::LessOrEqual),
            _ => Err(anyhow::anyhow!("Invalid condition: {s}")),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MonitorConfig {
    pub email: String,
    pub target_rate: f64,
    pub condition: Condition,
}

impl Default for MonitorConfig {
    /// Conservative prefill for an absent record. The empty email never
    /// passes validation, so this default can never produce a notification.
    fn default() -> Self {
        MonitorConfig {
            email: String::new(),
            target_rate: 0.0,
            condition: Condition::GreaterOrEqual,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_email(&self.email) {
            return Err(ConfigError::InvalidEmail);
        }
        if !(0.0..=100.0).contains(&self.target_rate) {
            return Err(ConfigError::InvalidRate);
        }
        Ok(())
    }
}

/// Reads and writes the single persisted configuration record.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "ratewatch", "ratewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when no record has been saved yet. Callers decide
    /// what an absent record means; a malformed one is an error.
    pub fn load(&self) -> Result<Option<MonitorConfig>, ConfigError> {
        if !self.path.exists() {
            debug!("No configuration file at {}", self.path.display());
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::Invalid(format!("unreadable config file: {e}")))?;
        let config: MonitorConfig = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Invalid(format!("malformed config file: {e}")))?;
        debug!("Loaded configuration from {}", self.path.display());
        Ok(Some(config))
    }

    /// Validates, then replaces the whole record. The write goes to a
    /// sibling temp file and is renamed into place so a concurrent reader
    /// never observes a partial record.
    pub fn save(&self, config: &MonitorConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Invalid(format!("unserializable config: {e}")))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

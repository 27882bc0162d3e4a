//! User settings for bankflow
//!
//! Display and validation preferences for the workflows: currency symbol,
//! payment reference length, phone number length and log filter.

use serde::{Deserialize, Serialize};

use super::paths::BankflowPaths;
use crate::error::FlowError;

/// User settings for bankflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when showing amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Longest accepted payment reference, in characters
    #[serde(default = "default_reference_max_length")]
    pub reference_max_length: usize,

    /// Fewest digits accepted in a phone number
    #[serde(default = "default_min_phone_digits")]
    pub min_phone_digits: usize,

    /// `tracing` filter directive (e.g. "info", "bankflow=debug")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "£".to_string()
}

fn default_reference_max_length() -> usize {
    50
}

fn default_min_phone_digits() -> usize {
    10
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            reference_max_length: default_reference_max_length(),
            min_phone_digits: default_min_phone_digits(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &BankflowPaths) -> Result<Self, FlowError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| FlowError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| FlowError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BankflowPaths) -> Result<(), FlowError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| FlowError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| FlowError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    fn validate(&self) -> Result<(), FlowError> {
        if self.reference_max_length == 0 {
            return Err(FlowError::Config(
                "reference_max_length must be at least 1".into(),
            ));
        }
        if self.currency_symbol.trim().is_empty() {
            return Err(FlowError::Config("currency_symbol cannot be empty".into()));
        }
        Ok(())
    }
}

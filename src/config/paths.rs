//! Path management for bankflow
//!
//! ## Path Resolution Order
//!
//! 1. `BANKFLOW_CONFIG_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/bankflow` or `~/.config/bankflow`
//! 3. Windows: `%APPDATA%\bankflow`

use std::path::PathBuf;

use crate::error::FlowError;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BANKFLOW_CONFIG_DIR";

/// Manages the paths used by bankflow
#[derive(Debug, Clone)]
pub struct BankflowPaths {
    base_dir: PathBuf,
}

impl BankflowPaths {
    /// Resolve the configuration directory
    ///
    /// # Errors
    ///
    /// Returns an error if no home or config directory can be determined.
    pub fn new() -> Result<Self, FlowError> {
        let base_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create BankflowPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the configuration directory exists
    pub fn ensure_directories(&self) -> Result<(), FlowError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| FlowError::Io(format!("Failed to create config directory: {}", e)))
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, FlowError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| FlowError::Config("Could not determine HOME directory".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("bankflow"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, FlowError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| FlowError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("bankflow"))
}

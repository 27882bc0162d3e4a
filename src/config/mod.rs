//! Configuration module for bankflow
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings loading and persistence

pub mod paths;
pub mod settings;

pub use paths::BankflowPaths;
pub use settings::Settings;

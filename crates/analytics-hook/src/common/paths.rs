//! Path Utilities
//!
//! Common path resolution for the hook's home directory.

use std::path::PathBuf;

use super::error::AnalyticsError;
use super::result::AnalyticsResult;

/// Get the hook base directory (`~/.analytics-hook/`)
pub fn hook_dir() -> AnalyticsResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AnalyticsError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".analytics-hook"))
}

/// Get the default config file path
pub fn config_path() -> AnalyticsResult<PathBuf> {
    Ok(hook_dir()?.join("config.json"))
}

/// Get the default connections file path
pub fn connections_path() -> AnalyticsResult<PathBuf> {
    Ok(hook_dir()?.join("connections.json"))
}

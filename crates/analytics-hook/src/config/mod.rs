//! Configuration management
//!
//! Handles reading hook settings from `~/.analytics-hook/config.json`.
//! Every field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::common::{config_path, AnalyticsError, AnalyticsResult};

const DEFAULT_PAGE_DELAY_MS: u64 = 1000;
const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HookConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Pause between report pages
    pub page_delay_ms: u64,
    /// `None` disables the page bound
    pub max_pages: Option<usize>,
    pub max_elapsed_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    /// Overrides the `token_uri` of service-account keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            max_pages: Some(DEFAULT_MAX_PAGES),
            max_elapsed_secs: None,
            reporting_url: None,
            management_url: None,
            upload_url: None,
            token_uri: None,
        }
    }
}

/// Upper bounds on a paginated report fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub max_pages: Option<usize>,
    pub max_elapsed: Option<Duration>,
}

impl PaginationLimits {
    pub fn unbounded() -> Self {
        Self {
            max_pages: None,
            max_elapsed: None,
        }
    }
}

impl HookConfig {
    /// Load `~/.analytics-hook/config.json`, falling back to defaults when absent
    pub fn load() -> AnalyticsResult<Self> {
        let path = config_path()?;
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> AnalyticsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalyticsError::Config(format!("Failed to read config {:?}: {}", path, e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AnalyticsError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn pagination_limits(&self) -> PaginationLimits {
        PaginationLimits {
            max_pages: self.max_pages,
            max_elapsed: self.max_elapsed_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HookConfig::default();
        assert_eq!(config.page_delay(), Duration::from_secs(1));
        assert_eq!(config.pagination_limits().max_pages, Some(1000));
        assert!(config.pagination_limits().max_elapsed.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"page_delay_ms": 250, "max_pages": null, "max_elapsed_secs": 60}}"#).unwrap();

        let config = HookConfig::load_from(file.path()).unwrap();
        assert_eq!(config.page_delay(), Duration::from_millis(250));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(
            config.pagination_limits(),
            PaginationLimits {
                max_pages: None,
                max_elapsed: Some(Duration::from_secs(60)),
            }
        );
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = HookConfig::load_from(file.path()).unwrap_err();
        assert!(err.is_configuration());
    }
}

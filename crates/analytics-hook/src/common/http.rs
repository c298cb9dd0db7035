//! HTTP Client Utilities
//!
//! Shared HTTP client creation with consistent configuration.

use std::time::Duration;

use crate::config::HookConfig;

use super::result::AnalyticsResult;

/// Create a reqwest HTTP client from the hook configuration
///
/// - request and connect timeouts from config
/// - identifies itself with `user_agent`
pub fn create_http_client(config: &HookConfig, user_agent: &str) -> AnalyticsResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

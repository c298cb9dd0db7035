//! Google Analytics hook for workflow tasks.
//!
//! Authenticates against the Analytics Reporting (v4) and Management (v3)
//! APIs, fetches reports with transparent pagination, and uploads data to
//! custom data sources.
//!
//! ```no_run
//! use analytics_hook::{Dimension, GoogleAnalyticsHook, Metric, ReportRequest};
//!
//! # async fn run() -> analytics_hook::AnalyticsResult<()> {
//! let hook = GoogleAnalyticsHook::from_defaults(None)?.with_key_file("/etc/keys/ga.json");
//! let report = hook
//!     .get_analytics_report(
//!         ReportRequest::new("12345", "7daysAgo", "today")
//!             .dimensions(vec![Dimension::new("ga:date")])
//!             .metrics(vec![Metric::new("ga:sessions")]),
//!     )
//!     .await?;
//! println!("{} fields", report.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod common;
pub mod config;
pub mod connection;
pub mod google;
pub mod hook;

pub use auth::{CredentialSource, Credentials};
pub use common::{AnalyticsError, AnalyticsResult, ErrorKind};
pub use config::{HookConfig, PaginationLimits};
pub use connection::{Connection, ConnectionRegistry, InMemoryConnections, JsonFileConnections, DEFAULT_CONN_ID};
pub use google::{
    AnalyticsService, DateRange, Dimension, GoogleClient, Metric, Report, ReportRequest, SamplingLevel,
    ServiceRole, Transport,
};
pub use hook::GoogleAnalyticsHook;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used, falling back to
/// `info` if it is not a valid filter. Does nothing if a subscriber is
/// already installed.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // `try_init` only fails when a global subscriber is already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing("debug");
        init_tracing("not a level ===");
        tracing::info!("tracing initialised twice without panicking");
    }
}

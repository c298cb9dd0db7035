//! Common Utilities
//!
//! Shared error handling, HTTP client construction and path helpers.

#[cfg(test)]
pub(crate) mod canned_http;
pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use error::{AnalyticsError, ErrorKind};
pub use http::create_http_client;
pub use paths::{config_path, connections_path, hook_dir};
pub use result::AnalyticsResult;

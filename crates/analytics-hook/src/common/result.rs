//! Common Result Type

use super::error::AnalyticsError;

/// Hook result type
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

//! Reporting API v4 request types
//!
//! Serialised in the API's camelCase JSON shape, e.g.
//!
//! ```json
//! {
//!   "viewId": "12345",
//!   "dateRanges": [{"startDate": "7daysAgo", "endDate": "today"}],
//!   "samplingLevel": "LARGE",
//!   "dimensions": [{"name": "ga:date"}],
//!   "metrics": [{"expression": "ga:sessions"}],
//!   "pageSize": 1000,
//!   "includeEmptyRows": false
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A report as returned by the API: `data.rows` plus server metadata
pub type Report = Map<String, Value>;

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Precision/speed tradeoff for server-side aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SamplingLevel {
    Default,
    Small,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histogram_buckets: Vec<String>,
}

impl Dimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            histogram_buckets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// `INTEGER`, `FLOAT`, `CURRENCY`, `PERCENT` or `TIME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting_type: Option<String>,
}

impl Metric {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: None,
            formatting_type: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// One `reportRequests` entry of a `reports:batchGet` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub sampling_level: SamplingLevel,
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    pub page_size: u32,
    pub include_empty_rows: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl ReportRequest {
    /// Request for `view_id` over `since..=until` with the default
    /// sampling level (`LARGE`), page size (1000) and no empty rows.
    pub fn new(view_id: impl Into<String>, since: impl Into<String>, until: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            date_ranges: vec![DateRange {
                start_date: since.into(),
                end_date: until.into(),
            }],
            sampling_level: SamplingLevel::Large,
            dimensions: Vec::new(),
            metrics: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            include_empty_rows: false,
            page_token: None,
        }
    }

    pub fn dimensions(mut self, dimensions: Vec<Dimension>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    /// `None` keeps `LARGE`
    pub fn sampling_level(mut self, level: Option<SamplingLevel>) -> Self {
        self.sampling_level = level.unwrap_or(SamplingLevel::Large);
        self
    }

    /// `None` keeps 1000
    pub fn page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        self
    }

    /// `None` keeps `false`
    pub fn include_empty_rows(mut self, include: Option<bool>) -> Self {
        self.include_empty_rows = include.unwrap_or(false);
        self
    }
}

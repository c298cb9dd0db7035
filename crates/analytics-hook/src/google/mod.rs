//! Google API Client Module
//!
//! Authenticated HTTP access to the Google Analytics Reporting (v4) and
//! Management (v3) APIs.

pub mod analytics;
pub mod client;
pub mod common;
pub mod reports;
pub mod services;

pub use analytics::AnalyticsService;
pub use client::{GoogleClient, Transport};
pub use reports::{DateRange, Dimension, Metric, Report, ReportRequest, SamplingLevel};
pub use services::{ServiceDescriptor, ServiceRole};

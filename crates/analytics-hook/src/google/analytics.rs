//! Google Analytics API Client
//!
//! Provides the operations a workflow task runs against Analytics:
//! - Core reporting queries through the Management API (v3)
//! - Paginated report fetches through the Reporting API (v4)
//! - Media uploads to custom data sources
//!
//! Pages are fetched strictly one after another with a fixed pause in
//! between, which keeps long reports under the API's request quotas.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::client::{GoogleClient, Transport};
use super::common::{extract_rows, next_page_token, replace_rows, take_first_report};
use super::reports::{Report, ReportRequest};
use super::services::{ServiceDescriptor, ServiceRole};
use crate::common::{AnalyticsError, AnalyticsResult};
use crate::config::{HookConfig, PaginationLimits};

const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Client handle bound to one Analytics service
pub struct AnalyticsService<T = GoogleClient> {
    role: ServiceRole,
    transport: T,
    root_url: String,
    upload_root_url: Option<String>,
    page_delay: Duration,
    limits: PaginationLimits,
}

impl<T: Transport> AnalyticsService<T> {
    /// Bind `transport` to `role`, applying URL overrides and pagination
    /// settings from `config`.
    pub fn new(role: ServiceRole, transport: T, config: &HookConfig) -> Self {
        let descriptor = role.descriptor();
        let (root_url, upload_root_url) = match role {
            ServiceRole::Reporting => (config.reporting_url.clone(), None),
            ServiceRole::Management => (config.management_url.clone(), config.upload_url.clone()),
        };

        Self {
            role,
            transport,
            root_url: root_url.unwrap_or_else(|| descriptor.root_url.to_string()),
            upload_root_url: upload_root_url.or_else(|| descriptor.upload_root_url.map(str::to_string)),
            page_delay: config.page_delay(),
            limits: config.pagination_limits(),
        }
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn descriptor(&self) -> &'static ServiceDescriptor {
        self.role.descriptor()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn with_limits(mut self, limits: PaginationLimits) -> Self {
        self.limits = limits;
        self
    }

    fn require_role(&self, role: ServiceRole) -> AnalyticsResult<()> {
        if self.role != role {
            return Err(AnalyticsError::Config(format!(
                "operation requires the {} service, handle is bound to {}",
                role, self.role
            )));
        }
        Ok(())
    }

    /// Run a core reporting query (`data/ga`) and return the response as-is.
    ///
    /// # Arguments
    /// * `view_id` - Table id, e.g. `ga:12345`
    /// * `since` / `until` - Date range in `YYYY-MM-DD` or relative form (`7daysAgo`)
    /// * `metrics` - Metric names, sent comma-joined
    /// * `dimensions` - Dimension names, sent comma-joined and omitted when empty
    ///
    /// No pagination: whatever the single call returns is the result.
    pub async fn management_report(
        &self,
        view_id: &str,
        since: &str,
        until: &str,
        metrics: &[String],
        dimensions: &[String],
    ) -> AnalyticsResult<Value> {
        self.require_role(ServiceRole::Management)?;
        info!(view_id, since, until, "Fetching management report");

        let mut query = vec![
            ("ids", view_id.to_string()),
            ("start-date", since.to_string()),
            ("end-date", until.to_string()),
            ("metrics", metrics.join(",")),
        ];
        if !dimensions.is_empty() {
            query.push(("dimensions", dimensions.join(",")));
        }

        let url = format!("{}/data/ga", self.root_url);
        self.transport.get(&url, &query).await
    }

    /// One `reports:batchGet` call carrying a single report request
    pub async fn batch_get(&self, request: &ReportRequest) -> AnalyticsResult<Value> {
        let body = json!({ "reportRequests": [request] });
        let url = format!("{}/reports:batchGet", self.root_url);
        self.transport.post(&url, &body).await
    }

    /// Fetch a report, following `nextPageToken` until the last page.
    ///
    /// Rows of all pages are merged into the returned report in page order.
    /// Every other field of the returned report comes from the last page
    /// fetched. A response without reports yields an empty report.
    pub async fn analytics_report(&self, mut request: ReportRequest) -> AnalyticsResult<Report> {
        self.require_role(ServiceRole::Reporting)?;
        info!(view_id = %request.view_id, "Fetching analytics report");

        let started = Instant::now();
        let response = self.batch_get(&request).await?;

        let Some(mut report) = take_first_report(response) else {
            info!(view_id = %request.view_id, "Report returned no data");
            return Ok(Report::new());
        };

        let mut rows = extract_rows(&report);
        let mut pages = 1;

        while let Some(token) = next_page_token(&report) {
            self.check_limits(pages, started)?;
            tokio::time::sleep(self.page_delay).await;

            debug!(page = pages + 1, "Fetching next report page");
            request.page_token = Some(token);
            let response = self.batch_get(&request).await?;

            report = take_first_report(response).ok_or_else(|| {
                AnalyticsError::UnexpectedResponse(format!("page {} contained no report", pages + 1))
            })?;
            rows.extend(extract_rows(&report));
            pages += 1;
        }

        info!(pages, rows = rows.len(), "Fetched analytics report");
        replace_rows(&mut report, rows);
        Ok(report)
    }

    fn check_limits(&self, pages: usize, started: Instant) -> AnalyticsResult<()> {
        let elapsed = started.elapsed();
        let too_many_pages = self.limits.max_pages.is_some_and(|max| pages >= max);
        let too_long = self.limits.max_elapsed.is_some_and(|max| elapsed >= max);

        if too_many_pages || too_long {
            return Err(AnalyticsError::PaginationExceeded { pages, elapsed });
        }
        Ok(())
    }

    /// Upload `payload` to a custom data source (non-resumable media upload)
    pub async fn upload_data(
        &self,
        account_id: &str,
        web_property_id: &str,
        custom_data_source_id: &str,
        payload: Vec<u8>,
    ) -> AnalyticsResult<()> {
        self.require_role(ServiceRole::Management)?;
        info!(
            account_id,
            web_property_id,
            custom_data_source_id,
            bytes = payload.len(),
            "Uploading data"
        );

        let upload_root = self.upload_root_url.as_deref().ok_or_else(|| {
            AnalyticsError::Config(format!("{} service has no upload endpoint", self.role))
        })?;

        let url = format!(
            "{}/management/accounts/{}/webproperties/{}/customDataSources/{}/uploads",
            upload_root,
            urlencoding::encode(account_id),
            urlencoding::encode(web_property_id),
            urlencoding::encode(custom_data_source_id),
        );
        let query = [("uploadType", "media".to_string())];

        self.transport
            .upload(&url, &query, payload, UPLOAD_CONTENT_TYPE)
            .await?;

        info!("Upload finished");
        Ok(())
    }
}

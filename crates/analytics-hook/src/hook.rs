//! Google Analytics hook
//!
//! Entry point for workflow tasks. A hook is bound to one connection id; the
//! connection is looked up once and each service handle is built once, on
//! first use.

use once_cell::sync::OnceCell;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::auth::CredentialSource;
use crate::common::AnalyticsResult;
use crate::config::HookConfig;
use crate::connection::{Connection, ConnectionRegistry, JsonFileConnections, DEFAULT_CONN_ID};
use crate::google::{
    AnalyticsService, Dimension, GoogleClient, Metric, Report, ReportRequest, SamplingLevel, ServiceRole,
};

pub struct GoogleAnalyticsHook<R = JsonFileConnections> {
    conn_id: String,
    registry: R,
    key_file: Option<PathBuf>,
    config: HookConfig,
    connection: OnceCell<Connection>,
    reporting: OnceCell<AnalyticsService>,
    management: OnceCell<AnalyticsService>,
}

impl GoogleAnalyticsHook<JsonFileConnections> {
    /// Hook reading `~/.analytics-hook/connections.json` and
    /// `~/.analytics-hook/config.json`
    pub fn from_defaults(conn_id: Option<&str>) -> AnalyticsResult<Self> {
        let registry = JsonFileConnections::default_location()?;
        let config = HookConfig::load()?;
        Ok(Self::new(conn_id.unwrap_or(DEFAULT_CONN_ID), registry).with_config(config))
    }
}

impl<R: ConnectionRegistry> GoogleAnalyticsHook<R> {
    pub fn new(conn_id: impl Into<String>, registry: R) -> Self {
        Self {
            conn_id: conn_id.into(),
            registry,
            key_file: None,
            config: HookConfig::default(),
            connection: OnceCell::new(),
            reporting: OnceCell::new(),
            management: OnceCell::new(),
        }
    }

    /// Service-account key file used when the connection carries no credentials
    pub fn with_key_file(mut self, key_file: impl Into<PathBuf>) -> Self {
        self.key_file = Some(key_file.into());
        self
    }

    pub fn with_config(mut self, config: HookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    pub fn key_file(&self) -> Option<&Path> {
        self.key_file.as_deref()
    }

    /// The connection profile, looked up on first call
    pub fn connection(&self) -> AnalyticsResult<&Connection> {
        self.connection.get_or_try_init(|| {
            debug!(conn_id = %self.conn_id, "Looking up connection");
            self.registry.get_connection(&self.conn_id)
        })
    }

    /// Which credential source this hook authenticates with
    pub fn credential_source(&self) -> AnalyticsResult<CredentialSource> {
        CredentialSource::select(self.connection()?, self.key_file())
    }

    /// Authenticated client handle for `role`. Fails with
    /// [`AnalyticsError::NoCredentials`](crate::AnalyticsError::NoCredentials)
    /// when neither the connection nor the hook provide credentials.
    pub fn get_service_object(&self, role: ServiceRole) -> AnalyticsResult<&AnalyticsService> {
        let cell = match role {
            ServiceRole::Reporting => &self.reporting,
            ServiceRole::Management => &self.management,
        };

        cell.get_or_try_init(|| {
            let descriptor = role.descriptor();
            let source = self.credential_source()?;
            info!(
                service = descriptor.name,
                version = descriptor.version,
                source = source.name(),
                "Building service object"
            );

            let credentials = source.into_credentials(descriptor.scopes, self.config.token_uri.as_deref())?;
            let client = GoogleClient::new(credentials, &self.config)?;
            Ok(AnalyticsService::new(role, client, &self.config))
        })
    }

    /// Core reporting query through the Management API, returned verbatim
    pub async fn get_management_report(
        &self,
        view_id: &str,
        since: &str,
        until: &str,
        metrics: &[String],
        dimensions: &[String],
    ) -> AnalyticsResult<Value> {
        self.get_service_object(ServiceRole::Management)?
            .management_report(view_id, since, until, metrics, dimensions)
            .await
    }

    /// Reporting API query with all pages merged into one report
    pub async fn get_analytics_report(&self, request: ReportRequest) -> AnalyticsResult<Report> {
        self.get_service_object(ServiceRole::Reporting)?
            .analytics_report(request)
            .await
    }

    /// [`get_analytics_report`](Self::get_analytics_report) with each request
    /// field as an argument. `None` keeps the default sampling level
    /// (`LARGE`), page size (1000) and `include_empty_rows` (`false`).
    #[allow(clippy::too_many_arguments)]
    pub async fn fetch_analytics_report(
        &self,
        view_id: &str,
        since: &str,
        until: &str,
        sampling_level: Option<SamplingLevel>,
        dimensions: Vec<Dimension>,
        metrics: Vec<Metric>,
        page_size: Option<u32>,
        include_empty_rows: Option<bool>,
    ) -> AnalyticsResult<Report> {
        let request = ReportRequest::new(view_id, since, until)
            .sampling_level(sampling_level)
            .dimensions(dimensions)
            .metrics(metrics)
            .page_size(page_size)
            .include_empty_rows(include_empty_rows);

        self.get_analytics_report(request).await
    }

    /// Upload `payload` to a custom data source
    pub async fn upload_data(
        &self,
        account_id: &str,
        web_property_id: &str,
        payload: impl Into<Vec<u8>>,
        custom_data_source_id: &str,
    ) -> AnalyticsResult<()> {
        self.get_service_object(ServiceRole::Management)?
            .upload_data(account_id, web_property_id, custom_data_source_id, payload.into())
            .await
    }
}

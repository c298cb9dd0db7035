//! Credential resolution
//!
//! A hook authenticates in exactly one of three ways, picked in a fixed order:
//!
//! 1. a bearer token stored in the connection's password,
//! 2. a service-account key inlined in the connection's extras,
//! 3. a service-account key file handed to the hook by the caller.
//!
//! Selection never touches the network. Service-account tokens are exchanged
//! lazily on the first request.

pub mod service_account;

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::common::{AnalyticsError, AnalyticsResult};
use crate::connection::Connection;

pub use service_account::{ServiceAccountCredentials, ServiceAccountKey, DEFAULT_TOKEN_URI};

/// Client identifier sent alongside bearer-token credentials
pub const ACCESS_TOKEN_CLIENT_ID: &str = concat!("analytics-hook/", env!("CARGO_PKG_VERSION"));

/// Where a hook's credentials come from
#[derive(Clone)]
pub enum CredentialSource {
    AccessToken(String),
    InlineServiceAccount(Map<String, Value>),
    KeyFile(PathBuf),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::AccessToken(_) => f.write_str("AccessToken([REDACTED])"),
            CredentialSource::InlineServiceAccount(_) => f.write_str("InlineServiceAccount([REDACTED])"),
            CredentialSource::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
        }
    }
}

impl CredentialSource {
    /// Pick the authoritative credential source. First match wins; later
    /// sources are not looked at once an earlier one is found.
    pub fn select(connection: &Connection, key_file: Option<&Path>) -> AnalyticsResult<Self> {
        if let Some(token) = connection.access_token() {
            return Ok(CredentialSource::AccessToken(token.to_string()));
        }

        if let Some(extra) = connection.inline_key() {
            return Ok(CredentialSource::InlineServiceAccount(extra.clone()));
        }

        if let Some(path) = key_file {
            return Ok(CredentialSource::KeyFile(path.to_path_buf()));
        }

        Err(AnalyticsError::NoCredentials)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CredentialSource::AccessToken(_) => "access_token",
            CredentialSource::InlineServiceAccount(_) => "inline_service_account",
            CredentialSource::KeyFile(_) => "key_file",
        }
    }

    /// Build credentials scoped to `scopes`. Reads the key file for
    /// [`CredentialSource::KeyFile`]; no network I/O.
    pub fn into_credentials(
        self,
        scopes: &[&str],
        token_uri_override: Option<&str>,
    ) -> AnalyticsResult<Credentials> {
        debug!(source = self.name(), "Building credentials");

        let key = match self {
            CredentialSource::AccessToken(token) => return Ok(Credentials::AccessToken(token)),
            CredentialSource::InlineServiceAccount(extra) => ServiceAccountKey::from_extras(&extra)?,
            CredentialSource::KeyFile(path) => ServiceAccountKey::from_file(&path)?,
        };

        Ok(Credentials::ServiceAccount(ServiceAccountCredentials::new(
            key,
            scopes,
            token_uri_override,
        )))
    }
}

/// Credentials bound to a service's scopes
pub enum Credentials {
    AccessToken(String),
    ServiceAccount(ServiceAccountCredentials),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken([REDACTED])"),
            Credentials::ServiceAccount(creds) => f.debug_tuple("ServiceAccount").field(creds).finish(),
        }
    }
}

impl Credentials {
    /// Bearer token for the next request
    pub async fn access_token(&self, http: &reqwest::Client) -> AnalyticsResult<String> {
        match self {
            Credentials::AccessToken(token) => Ok(token.clone()),
            Credentials::ServiceAccount(creds) => creds.access_token(http).await,
        }
    }

    pub fn is_service_account(&self) -> bool {
        matches!(self, Credentials::ServiceAccount(_))
    }
}

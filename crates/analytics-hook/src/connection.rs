//! Connection profiles
//!
//! A connection is what the orchestration platform stores for the hook: an
//! optional bearer token in `password` and a free-form `extra` object that
//! may hold an inline service-account key. Lookup goes through
//! [`ConnectionRegistry`] so the platform's own registry can be plugged in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::common::{connections_path, AnalyticsError, AnalyticsResult};

/// Connection id used when the caller does not name one
pub const DEFAULT_CONN_ID: &str = "google_analytics_default";

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

// Password and extras can both carry secrets
impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Connection {
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            extra: Map::new(),
        }
    }

    pub fn with_extra(extra: Map<String, Value>) -> Self {
        Self {
            password: None,
            extra,
        }
    }

    /// The bearer token, if the password field is set and non-empty
    pub fn access_token(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Extras carry an inline service-account key when they name a `client_id`
    pub fn inline_key(&self) -> Option<&Map<String, Value>> {
        self.extra.contains_key("client_id").then_some(&self.extra)
    }
}

/// Lookup of connection profiles by id
pub trait ConnectionRegistry {
    fn get_connection(&self, conn_id: &str) -> AnalyticsResult<Connection>;
}

/// Registry backed by a map, for embedding and tests
#[derive(Debug, Default, Clone)]
pub struct InMemoryConnections {
    connections: HashMap<String, Connection>,
}

impl InMemoryConnections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, conn_id: impl Into<String>, connection: Connection) -> Self {
        self.insert(conn_id, connection);
        self
    }

    pub fn insert(&mut self, conn_id: impl Into<String>, connection: Connection) {
        self.connections.insert(conn_id.into(), connection);
    }
}

impl ConnectionRegistry for InMemoryConnections {
    fn get_connection(&self, conn_id: &str) -> AnalyticsResult<Connection> {
        self.connections
            .get(conn_id)
            .cloned()
            .ok_or_else(|| AnalyticsError::ConnectionNotFound(conn_id.to_string()))
    }
}

/// Registry backed by a JSON file mapping connection ids to profiles
///
/// ```json
/// { "google_analytics_default": { "password": "", "extra": { "client_id": "..." } } }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileConnections {
    path: PathBuf,
}

impl JsonFileConnections {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.analytics-hook/connections.json`
    pub fn default_location() -> AnalyticsResult<Self> {
        Ok(Self::new(connections_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionRegistry for JsonFileConnections {
    fn get_connection(&self, conn_id: &str) -> AnalyticsResult<Connection> {
        debug!("Reading connection {} from {:?}", conn_id, self.path);

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AnalyticsError::Config(format!("Failed to read connections {:?}: {}", self.path, e))
        })?;

        let mut all: HashMap<String, Connection> = serde_json::from_str(&content)
            .map_err(|e| AnalyticsError::Config(format!("Failed to parse connections JSON: {}", e)))?;

        all.remove(conn_id)
            .ok_or_else(|| AnalyticsError::ConnectionNotFound(conn_id.to_string()))
    }
}

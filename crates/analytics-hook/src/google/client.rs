//! Google API Authenticated HTTP Client
//!
//! Provides an authenticated HTTP client that injects the bearer token from
//! the hook's credentials. Handles rate limiting and error responses
//! according to Google API REST conventions.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::{Credentials, ACCESS_TOKEN_CLIENT_ID};
use crate::common::{create_http_client, AnalyticsError, AnalyticsResult};
use crate::config::HookConfig;

/// The request surface an Analytics service needs from HTTP.
///
/// [`GoogleClient`] is the real implementation; tests script responses.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// GET `url` with query parameters, returning the JSON body
    async fn get(&self, url: &str, query: &[(&str, String)]) -> AnalyticsResult<Value>;

    /// POST a JSON body to `url`, returning the JSON body
    async fn post(&self, url: &str, body: &Value) -> AnalyticsResult<Value>;

    /// POST raw media bytes to `url`
    async fn upload(
        &self,
        url: &str,
        query: &[(&str, String)],
        media: Vec<u8>,
        content_type: &str,
    ) -> AnalyticsResult<Value>;
}

/// Google API HTTP client with token injection
pub struct GoogleClient {
    client: Client,
    credentials: Credentials,
}

impl GoogleClient {
    /// Create a client for `credentials`. No request is made until one of the
    /// [`Transport`] methods is called.
    pub fn new(credentials: Credentials, config: &HookConfig) -> AnalyticsResult<Self> {
        let client = create_http_client(config, ACCESS_TOKEN_CLIENT_ID)?;

        Ok(Self {
            client,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn authorize(&self, builder: RequestBuilder) -> AnalyticsResult<RequestBuilder> {
        let token = self.credentials.access_token(&self.client).await?;
        Ok(builder.bearer_auth(token))
    }

    /// Execute a request and handle Google API response patterns
    async fn execute_request(&self, builder: RequestBuilder) -> AnalyticsResult<Value> {
        debug!("Executing Google API request");

        let response = self.authorize(builder).await?.send().await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by Google API");
            return Err(AnalyticsError::RateLimited);
        }

        let body = response.text().await?;

        // Empty successful responses (e.g. media uploads without metadata)
        if status.is_success() && body.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        if !status.is_success() {
            let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let err = extract_error(&parsed, status);
            error!("Google API error: {}", err);
            return Err(err);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl Transport for GoogleClient {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> AnalyticsResult<Value> {
        self.execute_request(self.client.get(url).query(query)).await
    }

    async fn post(&self, url: &str, body: &Value) -> AnalyticsResult<Value> {
        self.execute_request(self.client.post(url).json(body)).await
    }

    async fn upload(
        &self,
        url: &str,
        query: &[(&str, String)],
        media: Vec<u8>,
        content_type: &str,
    ) -> AnalyticsResult<Value> {
        let builder = self
            .client
            .post(url)
            .query(query)
            .header(CONTENT_TYPE, content_type)
            .body(media);

        self.execute_request(builder).await
    }
}

/// Build an error from a Google API error response
fn extract_error(response: &Value, status: StatusCode) -> AnalyticsError {
    // {"error": {"code": 400, "message": "Invalid request", "errors": [...]}}
    if let Some(error_obj) = response.get("error") {
        if let Some(message) = error_obj.get("message").and_then(|v| v.as_str()) {
            let code = error_obj
                .get("code")
                .and_then(|v| v.as_u64())
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(status.as_u16());

            return AnalyticsError::Api {
                code,
                message: message.to_string(),
            };
        }
    }

    AnalyticsError::Api {
        code: status.as_u16(),
        message: format!("HTTP {} error", status),
    }
}

//! Service Account Credentials
//!
//! Implements the OAuth2 JWT-bearer flow for Google service accounts: a
//! short-lived assertion is signed with the account's private key and traded
//! at the token endpoint for an access token. Tokens are cached until they
//! are about to expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::common::{AnalyticsError, AnalyticsResult};

// ── Google OAuth endpoints ──────────────────────────────────────────────────

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

// ── Key material ────────────────────────────────────────────────────────────

/// Google service-account JSON key
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ServiceAccountKey {
    #[serde(default, rename = "type")]
    #[zeroize(skip)]
    pub key_type: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub project_id: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    #[zeroize(skip)]
    pub client_email: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub client_id: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[REDACTED]")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Read a JSON key file from disk
    pub fn from_file(path: &Path) -> AnalyticsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalyticsError::Credentials(format!("Failed to read key file {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| AnalyticsError::Credentials(format!("Invalid key file {:?}: {}", path, e)))
    }

    /// Build a key from a connection's extras object
    pub fn from_extras(extra: &Map<String, Value>) -> AnalyticsResult<Self> {
        serde_json::from_value(Value::Object(extra.clone())).map_err(|e| {
            AnalyticsError::Credentials(format!("Invalid inline service account key: {}", e))
        })
    }

    /// Sign assertion claims with the private key (RS256)
    fn sign_assertion(&self, claims: &AssertionClaims) -> AnalyticsResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| AnalyticsError::Credentials(format!("Invalid private key: {}", e)))?;

        jsonwebtoken::encode(&header, claims, &key)
            .map_err(|e| AnalyticsError::Credentials(format!("Failed to sign assertion: {}", e)))
    }
}

/// Claims of the JWT-bearer assertion
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl AssertionClaims {
    fn new(key: &ServiceAccountKey, scopes: &[String], token_uri: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: scopes.join(" "),
            aud: token_uri.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

// ── Token cache ─────────────────────────────────────────────────────────────

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct CachedToken {
    access_token: String,
    #[zeroize(skip)]
    expires_at: DateTime<Utc>,
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CachedToken {
    fn is_expiring(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.expires_at
            .checked_sub_signed(Duration::seconds(margin_secs))
            .map_or(true, |refresh_at| refresh_at <= now)
    }
}

/// Scoped service-account credentials with a cached access token
pub struct ServiceAccountCredentials {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    token_uri: String,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.key.client_email)
            .field("scopes", &self.scopes)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountCredentials {
    /// Scope a key. `token_uri_override` wins over the key's own `token_uri`.
    pub fn new(key: ServiceAccountKey, scopes: &[&str], token_uri_override: Option<&str>) -> Self {
        let token_uri = token_uri_override
            .map(str::to_string)
            .or_else(|| key.token_uri.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        Self {
            key,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            token_uri,
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Return a valid access token, exchanging a fresh assertion when the
    /// cached one is missing or within a minute of expiry.
    pub async fn access_token(&self, http: &reqwest::Client) -> AnalyticsResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expiring(Utc::now(), EXPIRY_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
            debug!("Cached service account token is expiring, refreshing");
        }

        let fresh = self.fetch_token(http).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_token(&self, http: &reqwest::Client) -> AnalyticsResult<CachedToken> {
        info!(client_email = %self.key.client_email, "Exchanging service account assertion");

        let now = Utc::now();
        let claims = AssertionClaims::new(&self.key, &self.scopes, &self.token_uri, now);
        let assertion = self.key.sign_assertion(&claims)?;

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
        let body = post_form(http, &self.token_uri, &params).await?;
        parse_token_response(&body, now)
    }
}

// ── HTTP utilities ──────────────────────────────────────────────────────────

/// POST a form-encoded request and return the response body.
async fn post_form(
    http: &reqwest::Client,
    url: &str,
    params: &[(&str, &str)],
) -> AnalyticsResult<String> {
    let response = http.post(url).form(params).send().await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        error!("Token endpoint returned HTTP {}", status);
        return Err(AnalyticsError::TokenExchange(format!(
            "HTTP {} error: {}",
            status,
            describe_token_error(&body).unwrap_or_else(|| body.clone())
        )));
    }

    Ok(body)
}

/// `"error: error_description"` from an OAuth2 error body, if it is one
fn describe_token_error(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let err = parsed.get("error").and_then(|v| v.as_str())?;
    let desc = parsed
        .get("error_description")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error");
    Some(format!("{}: {}", err, desc))
}

/// Parse a Google OAuth2 token response.
fn parse_token_response(body: &str, issued_at: DateTime<Utc>) -> AnalyticsResult<CachedToken> {
    if let Some(message) = describe_token_error(body) {
        return Err(AnalyticsError::TokenExchange(message));
    }

    let parsed: Value = serde_json::from_str(body)?;

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AnalyticsError::TokenExchange("Missing access_token in response".to_string()))?
        .to_string();

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);

    let expires_at = Duration::try_seconds(expires_in)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| AnalyticsError::TokenExchange(format!("Invalid expires_in: {}", expires_in)))?;

    Ok(CachedToken {
        access_token,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::canned_http::CannedServer;
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;
    use std::io::Write;

    const TEST_PRIVATE_KEY: &str = include_str!("testdata/test_key.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("testdata/test_key.pub.pem");

    fn test_key(private_key: &str) -> ServiceAccountKey {
        ServiceAccountKey::from_extras(
            json!({
                "type": "service_account",
                "project_id": "demo-project",
                "private_key_id": "kid-1",
                "private_key": private_key,
                "client_email": "reporter@demo-project.iam.gserviceaccount.com",
                "client_id": "1234567890",
                "token_uri": "https://oauth2.googleapis.com/token"
            })
            .as_object()
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_key_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"private_key": "pem", "client_email": "svc@demo.iam.gserviceaccount.com"}}"#
        )
        .unwrap();

        let key = ServiceAccountKey::from_file(file.path()).unwrap();
        assert_eq!(key.client_email, "svc@demo.iam.gserviceaccount.com");
        assert!(key.token_uri.is_none());
    }

    #[test]
    fn test_key_from_missing_file() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_extras_without_private_key_rejected() {
        let extra = json!({"client_id": "1", "client_email": "svc@demo.iam.gserviceaccount.com"});
        let err = ServiceAccountKey::from_extras(extra.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Credentials(_)));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let rendered = format!("{:?}", test_key(TEST_PRIVATE_KEY));
        assert!(!rendered.contains("BEGIN PRIVATE KEY"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_token_uri_precedence() {
        let scopes = ["https://www.googleapis.com/auth/analytics"];
        let creds = ServiceAccountCredentials::new(test_key("pem"), &scopes, None);
        assert_eq!(creds.token_uri(), "https://oauth2.googleapis.com/token");

        let creds = ServiceAccountCredentials::new(test_key("pem"), &scopes, Some("http://localhost/token"));
        assert_eq!(creds.token_uri(), "http://localhost/token");
        assert_eq!(creds.scopes(), ["https://www.googleapis.com/auth/analytics"]);
    }

    #[test]
    fn test_signed_assertion_verifies() {
        let key = test_key(TEST_PRIVATE_KEY);
        let scopes = vec![
            "https://www.googleapis.com/auth/analytics".to_string(),
            "https://www.googleapis.com/auth/analytics.readonly".to_string(),
        ];
        let claims = AssertionClaims::new(&key, &scopes, DEFAULT_TOKEN_URI, Utc::now());
        let jwt = key.sign_assertion(&claims).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URI]);
        let decoded = jsonwebtoken::decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.kid.as_deref(), Some("kid-1"));
        assert_eq!(decoded.claims, claims);
        assert_eq!(decoded.claims.iss, "reporter@demo-project.iam.gserviceaccount.com");
        assert_eq!(
            decoded.claims.scope,
            "https://www.googleapis.com/auth/analytics https://www.googleapis.com/auth/analytics.readonly"
        );
        assert_eq!(decoded.claims.exp - decoded.claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_invalid_pem_is_credentials_error() {
        let key = test_key("not a pem");
        let claims = AssertionClaims::new(&key, &[], DEFAULT_TOKEN_URI, Utc::now());
        let err = key.sign_assertion(&claims).unwrap_err();
        assert!(matches!(err, AnalyticsError::Credentials(_)));
    }

    #[test]
    fn test_parse_token_response_success() {
        let now = Utc::now();
        let body = r#"{"access_token": "ya29.svc", "expires_in": 1800, "token_type": "Bearer"}"#;
        let token = parse_token_response(body, now).unwrap();
        assert_eq!(token.access_token, "ya29.svc");
        assert_eq!(token.expires_at, now + Duration::seconds(1800));
    }

    #[test]
    fn test_parse_token_response_error() {
        let body = r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#;
        let err = parse_token_response(body, Utc::now()).unwrap_err();
        assert!(matches!(err, AnalyticsError::TokenExchange(ref m) if m.contains("invalid_grant")));
    }

    #[test]
    fn test_token_expiry_margin() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(token.is_expiring(now, 60));
        assert!(!token.is_expiring(now, 0));
    }

    #[tokio::test]
    async fn test_cached_token_reused_without_exchange() {
        let creds = ServiceAccountCredentials::new(
            test_key("not a pem"),
            &["https://www.googleapis.com/auth/analytics"],
            Some("http://127.0.0.1:1/token"),
        );
        *creds.cached.lock().await = Some(CachedToken {
            access_token: "ya29.cached".to_string(),
            expires_at: Utc::now() + Duration::seconds(3600),
        });

        let token = creds.access_token(&reqwest::Client::new()).await.unwrap();
        assert_eq!(token, "ya29.cached");
    }

    #[test]
    fn test_out_of_range_expiry_is_error() {
        let body = r#"{"access_token": "t", "expires_in": 9223372036854775807}"#;
        let err = parse_token_response(body, Utc::now()).unwrap_err();
        assert!(matches!(err, AnalyticsError::TokenExchange(ref m) if m.contains("expires_in")));

        let body = r#"{"access_token": "t", "expires_in": -9223372036854775807}"#;
        assert!(parse_token_response(body, Utc::now()).is_err());
    }

    #[test]
    fn test_cached_token_debug_redacts() {
        let token = CachedToken {
            access_token: "ya29.secret".to_string(),
            expires_at: Utc::now(),
        };
        assert!(!format!("{:?}", token).contains("ya29.secret"));
    }

    #[tokio::test]
    async fn test_token_exchange_posts_assertion_and_caches() {
        let server = CannedServer::start(vec![(
            200,
            r#"{"access_token": "ya29.fresh", "expires_in": 3600, "token_type": "Bearer"}"#,
        )])
        .await;
        let token_uri = format!("{}/token", server.url);
        let creds = ServiceAccountCredentials::new(
            test_key(TEST_PRIVATE_KEY),
            &["https://www.googleapis.com/auth/analytics"],
            Some(&token_uri),
        );
        let http = reqwest::Client::new();

        assert_eq!(creds.access_token(&http).await.unwrap(), "ya29.fresh");
        assert_eq!(creds.access_token(&http).await.unwrap(), "ya29.fresh");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /token "));
        assert!(requests[0]
            .to_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));
        assert!(requests[0].contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"));
        assert!(requests[0].contains("&assertion=ey"));
    }

    #[tokio::test]
    async fn test_token_exchange_rejected() {
        let server = CannedServer::start(vec![(
            400,
            r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#,
        )])
        .await;
        let token_uri = format!("{}/token", server.url);
        let creds = ServiceAccountCredentials::new(test_key(TEST_PRIVATE_KEY), &[], Some(&token_uri));

        let err = creds.access_token(&reqwest::Client::new()).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::TokenExchange(ref m) if m.contains("invalid_grant")));
    }
}

//! OAuth2 client-credentials token management.
//!
//! The token manager owns the current access token and its expiry. Callers
//! ask for a bearer value; the manager renews it on first use and whenever
//! the expiry (minus a safety margin) has passed. The cache mutex is held
//! across the exchange round-trip, so concurrent callers that all observe
//! an expired token collapse onto a single in-flight renewal instead of
//! racing the authorization server.
//!
//! The manager never retries a failed exchange; retry policy belongs to
//! the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::{
    HeaderValue, Request,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use powerq_common::error::{AuthError, TransportError};
use powerq_common::http_client::HttpClient;

/// Path of the authorization endpoint relative to the base URL.
const TOKEN_PATH: &str = "/oauth/access_token";

/// Renewal headroom applied before the reported expiry.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Client credentials for the OAuth2 exchange.
///
/// Supplied once at construction and never logged; `Debug` redacts the
/// secret.
#[derive(Clone)]
pub struct Credentials {
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Render the HTTP Basic authorization header value.
    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(raw))
    }
}

/// A cached access token and its computed expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer value presented to the query endpoint
    pub value: String,
    /// Absolute instant the server-reported lifetime runs out
    pub expires_at: Instant,
}

impl AccessToken {
    /// Whether the token should be renewed rather than reused.
    pub fn needs_renewal(&self, margin: Duration) -> bool {
        let deadline = self.expires_at.checked_sub(margin).unwrap_or(self.expires_at);
        Instant::now() >= deadline
    }
}

#[derive(Serialize)]
struct TokenRequest {
    grant_type: &'static str,
}

/// Wire shape of the token endpoint's success body.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    expires_in: ExpiresIn,
}

/// Lifetime in seconds. Some server versions send this as a decimal
/// string rather than a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<u64> {
        match self {
            ExpiresIn::Seconds(s) => Some(*s),
            ExpiresIn::Text(t) => t.trim().parse().ok(),
        }
    }
}

/// Owns the client-credentials exchange and the cached access token.
pub struct TokenManager<C> {
    http: Arc<C>,
    credentials: Credentials,
    token_url: Url,
    safety_margin: Duration,
    current: Mutex<Option<AccessToken>>,
}

impl<C> TokenManager<C> {
    /// Create a manager for the given authorization endpoint base.
    pub fn new(http: Arc<C>, base: &Url, credentials: Credentials) -> Self {
        let mut token_url = base.clone();
        let mut path = token_url.path().trim_end_matches('/').to_owned();
        path.push_str(TOKEN_PATH);
        token_url.set_path(&path);
        Self {
            http,
            credentials,
            token_url,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            current: Mutex::new(None),
        }
    }

    /// Override the renewal safety margin.
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Drop the cached token so the next caller performs a fresh exchange.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}

impl<C: HttpClient + Sync> TokenManager<C> {
    /// Return a valid bearer value, renewing the token if needed.
    ///
    /// The cache lock is held across the exchange, so at most one renewal
    /// is in flight; concurrent callers await its outcome.
    pub async fn bearer(&self) -> Result<String, AuthError> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref()
            && !token.needs_renewal(self.safety_margin)
        {
            return Ok(token.value.clone());
        }

        tracing::debug!(endpoint = %self.token_url, "renewing access token");
        let fresh = self.exchange().await?;
        let value = fresh.value.clone();
        *current = Some(fresh);
        Ok(value)
    }

    /// Perform one client-credentials exchange against the token endpoint.
    async fn exchange(&self) -> Result<AccessToken, AuthError> {
        let request = self.build_exchange_request()?;

        let response = self
            .http
            .send_http(request)
            .await
            .map_err(C::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Unauthorized(status));
        }

        let body: TokenResponse = serde_json::from_slice(response.body())?;
        let expires_in = body.expires_in.seconds().ok_or_else(|| {
            AuthError::MalformedResponse(serde::de::Error::custom(
                "expires_in is not a number of seconds",
            ))
        })?;

        Ok(AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        })
    }

    fn build_exchange_request(&self) -> Result<Request<Vec<u8>>, AuthError> {
        let auth = HeaderValue::from_str(&self.credentials.basic_auth()).map_err(|e| {
            TransportError::InvalidRequest(format!("Invalid credentials header: {e}"))
        })?;
        let body = serde_html_form::to_string(TokenRequest {
            grant_type: "client_credentials",
        })
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Request::builder()
            .method(http::Method::POST)
            .uri(self.token_url.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, auth)
            .body(body.into_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
    }
}

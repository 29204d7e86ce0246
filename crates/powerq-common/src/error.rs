//! Error types for power-query client operations

use bytes::Bytes;
use smol_str::SmolStr;

/// Client error type wrapping all possible error conditions
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ClientError {
    /// Token exchange failed
    #[error("Authentication error: {0}")]
    Auth(
        #[from]
        #[diagnostic_source]
        AuthError,
    ),

    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// Response deserialization failed
    #[error("{0}")]
    Decode(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Construction-time configuration errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// Base URL did not parse
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(
        #[from]
        #[source]
        url::ParseError,
    ),

    /// Client ID was empty
    #[error("Client ID must not be empty")]
    MissingClientId,

    /// Client secret was empty
    #[error("Client secret must not be empty")]
    MissingClientSecret,
}

/// Errors from the OAuth2 client-credentials token exchange
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AuthError {
    /// Token endpoint answered 2xx but the body was not a usable token
    #[error("Malformed token response: {0}")]
    MalformedResponse(
        #[from]
        #[source]
        serde_json::Error,
    ),

    /// Token endpoint rejected the credentials
    #[error("Token endpoint returned HTTP {0}")]
    Unauthorized(http::StatusCode),

    /// The exchange round-trip itself failed
    #[error("Token exchange transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),
}

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to server
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Query endpoint answered 401/403; the caller may force a token
    /// renewal and retry once
    #[error("Unauthorized: HTTP {0}")]
    Unauthorized(http::StatusCode),

    /// Any other non-2xx response from the query endpoint
    #[error("HTTP {status}")]
    Server {
        /// HTTP status code
        status: http::StatusCode,
        /// Response body if available
        body: Option<Bytes>,
    },

    /// Other transport error
    #[error("Transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

/// Response deserialization errors
///
/// Decoding is all-or-nothing: the first failing record aborts the decode,
/// so a partial roster is never returned.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// Response body was not valid JSON
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),

    /// Top-level JSON was neither an array nor a record envelope
    #[error("Unexpected response envelope: {0}")]
    Envelope(SmolStr),

    /// A record was missing a required field
    #[error("Record {index}: missing field `{name}`")]
    MissingField {
        /// Position of the record in the server's array
        index: usize,
        /// Name of the absent field
        name: SmolStr,
    },

    /// A record field had the wrong JSON type
    #[error("Record {index}: {detail}")]
    TypeMismatch {
        /// Position of the record in the server's array
        index: usize,
        /// serde's description of the mismatch
        detail: SmolStr,
    },

    /// Any other per-record deserialization failure
    #[error("Record {index}: {source}")]
    Record {
        /// Position of the record in the server's array
        index: usize,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

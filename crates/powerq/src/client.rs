//! Public client facade.
//!
//! One method per known power query, each composing the token manager, the
//! query executor, and the response decoder. Every call resolves exactly
//! once with either a fully-typed record sequence or an error, never both.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use powerq_common::error::{ClientError, ConfigError, Result, TransportError};
use powerq_common::http_client::HttpClient;

use crate::decode::decode_records;
use crate::query::{
    HomeroomRosterForTeacher, PowerQuery, SectionsForCourseNumber, SectionsForTeacher,
    build_http_request, process_response,
};
use crate::records::{CourseSection, HomeroomRosterEntry};
use crate::token::{Credentials, TokenManager};

/// Asynchronous client for a school-information-system's power queries.
///
/// Cheap to share behind an `Arc`; concurrent operations against the same
/// instance are fine and the cached access token is renewed at most once
/// at a time.
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use powerq::Client;
///
/// let client = Client::new("https://sis.example.org", "client-id", "client-secret")?;
/// let sections = client.sections_for_course_number("101").await?;
/// for section in &sections {
///     println!("{} period {}", section.course_name, section.period);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client<C = reqwest::Client> {
    http: Arc<C>,
    base: Url,
    tokens: TokenManager<C>,
}

impl Client<reqwest::Client> {
    /// Create a client backed by a default `reqwest::Client`.
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> core::result::Result<Self, ConfigError> {
        Self::on(reqwest::Client::new(), base_url, client_id, client_secret)
    }

    /// Create a client whose network round-trips time out after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> core::result::Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("default reqwest client configuration is valid");
        Self::on(http, base_url, client_id, client_secret)
    }
}

impl<C: HttpClient> Client<C> {
    /// Create a client on top of any [`HttpClient`] implementation.
    pub fn on(
        http: C,
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> core::result::Result<Self, ConfigError> {
        let base = Url::parse(base_url)?;
        let credentials = Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        };
        if credentials.client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if credentials.client_secret.is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        let http = Arc::new(http);
        let tokens = TokenManager::new(http.clone(), &base, credentials);
        Ok(Self { http, base, tokens })
    }

    /// Override the token renewal safety margin.
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.tokens = self.tokens.with_safety_margin(margin);
        self
    }
}

impl<C: HttpClient + Sync> Client<C> {
    /// Run any power query and decode its records.
    ///
    /// Ensures a valid token, sends the request once, and decodes the
    /// response. When the query endpoint answers 401/403 the cached token
    /// is dropped and the request retried exactly once with a fresh one; a
    /// second unauthorized answer is terminal.
    #[tracing::instrument(level = "debug", skip(self, query), fields(query = Q::NAME))]
    pub async fn run_query<Q>(&self, query: &Q) -> Result<Vec<Q::Record>>
    where
        Q: PowerQuery + Sync,
    {
        let bearer = self.tokens.bearer().await?;
        match self.execute(query, &bearer).await {
            Err(ClientError::Transport(TransportError::Unauthorized(status))) => {
                tracing::debug!(%status, "query unauthorized, forcing token renewal");
                self.tokens.invalidate().await;
                let bearer = self.tokens.bearer().await?;
                self.execute(query, &bearer).await
            }
            outcome => outcome,
        }
    }

    /// One request/decode round-trip with the given bearer token.
    async fn execute<Q>(&self, query: &Q, bearer: &str) -> Result<Vec<Q::Record>>
    where
        Q: PowerQuery,
    {
        let request = build_http_request(&self.base, query, bearer)?;
        let response = self
            .http
            .send_http(request)
            .await
            .map_err(C::transport_error)?;
        let raw = process_response(response)?;
        Ok(decode_records(&raw)?)
    }

    /// Homeroom roster for the teacher with the given DCID.
    pub async fn homeroom_roster_for_teacher(
        &self,
        teacher_dcid: impl Into<String>,
    ) -> Result<Vec<HomeroomRosterEntry>> {
        self.run_query(&HomeroomRosterForTeacher {
            teacher_dcid: teacher_dcid.into(),
        })
        .await
    }

    /// All sections of the course with the given course number.
    pub async fn sections_for_course_number(
        &self,
        course_number: impl Into<String>,
    ) -> Result<Vec<CourseSection>> {
        self.run_query(&SectionsForCourseNumber {
            course_number: course_number.into(),
        })
        .await
    }

    /// All sections taught by the teacher with the given id.
    pub async fn sections_for_teacher(
        &self,
        teacher_id: impl Into<String>,
    ) -> Result<Vec<CourseSection>> {
        self.run_query(&SectionsForTeacher {
            teacher_id: teacher_id.into(),
        })
        .await
    }
}

//! Power-query request types and HTTP request/response mapping.
//!
//! A power query is a named, pre-defined server-side query exposed under
//! `/ws/schema/query/<name>`, taking a JSON parameter body and returning a
//! JSON array of records. The known queries form a small closed set, each
//! tagged with its query name, parameter shape, and record type via the
//! [`PowerQuery`] trait.

use bytes::Bytes;
use http::{
    HeaderValue, Request,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use powerq_common::error::TransportError;

/// Path prefix all power queries live under.
const QUERY_PATH: &str = "/ws/schema/query/";

/// Error type for encoding power-query requests
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// Failed to serialize the JSON parameter body
    #[error("Failed to serialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
}

/// Trait for power-query request types.
///
/// Implemented on the parameter struct itself; the serialized form is the
/// JSON parameter body the endpoint expects.
pub trait PowerQuery: Serialize {
    /// The server-side name of this query
    const NAME: &'static str;

    /// Record type each element of the response decodes into
    type Record: DeserializeOwned;

    /// Encode the JSON parameter body.
    fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Parameters for the homeroom-roster query, keyed by teacher DCID.
#[derive(Debug, Clone, Serialize)]
pub struct HomeroomRosterForTeacher {
    /// Internal database id of the teacher
    pub teacher_dcid: String,
}

impl PowerQuery for HomeroomRosterForTeacher {
    const NAME: &'static str = "org.powerq.teachers.homeroom_roster";
    type Record = crate::records::HomeroomRosterEntry;
}

/// Parameters for the sections-for-course query.
#[derive(Debug, Clone, Serialize)]
pub struct SectionsForCourseNumber {
    /// Business-facing course number
    pub course_number: String,
}

impl PowerQuery for SectionsForCourseNumber {
    const NAME: &'static str = "org.powerq.sections.for_course_number";
    type Record = crate::records::CourseSection;
}

/// Parameters for the sections-for-teacher query.
#[derive(Debug, Clone, Serialize)]
pub struct SectionsForTeacher {
    /// Identifier of the teacher of record
    pub teacher_id: String,
}

impl PowerQuery for SectionsForTeacher {
    const NAME: &'static str = "org.powerq.sections.for_teacher";
    type Record = crate::records::CourseSection;
}

/// Build the HTTP request for a power query given base URL and bearer token.
pub fn build_http_request<Q>(
    base: &Url,
    query: &Q,
    bearer: &str,
) -> Result<Request<Vec<u8>>, TransportError>
where
    Q: PowerQuery,
{
    let mut url = base.clone();
    let mut path = url.path().trim_end_matches('/').to_owned();
    path.push_str(QUERY_PATH);
    path.push_str(Q::NAME);
    url.set_path(&path);

    let auth = HeaderValue::from_str(&format!("Bearer {bearer}"))
        .map_err(|e| TransportError::InvalidRequest(format!("Invalid bearer token: {e}")))?;

    let body = query
        .encode_body()
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

    Request::builder()
        .method(http::Method::POST)
        .uri(url.as_str())
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .header(AUTHORIZATION, auth)
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

/// Classify the HTTP response from the query endpoint.
///
/// 2xx yields the raw body bytes for the decoder. 401/403 is surfaced as
/// [`TransportError::Unauthorized`] so the facade can force a token renewal
/// and retry once. Every other status is a server error carrying the body.
pub fn process_response(response: http::Response<Vec<u8>>) -> Result<Bytes, TransportError> {
    let status = response.status();
    let buffer = Bytes::from(response.into_body());

    if status.is_success() {
        Ok(buffer)
    } else if matches!(status.as_u16(), 401 | 403) {
        Err(TransportError::Unauthorized(status))
    } else {
        Err(TransportError::Server {
            status,
            body: Some(buffer),
        })
    }
}

//! # powerq
//!
//! Typed, asynchronous client for a school-information-system's "power
//! query" REST endpoints: pre-defined server-side queries such as homeroom
//! rosters and course sections, exposed here as one method per query.
//!
//! The client handles the OAuth2 client-credentials exchange, caches the
//! access token until its expiry, dispatches named queries against
//! `/ws/schema/query/<name>`, and decodes the heterogeneous JSON payloads
//! into flat domain records.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use powerq::Client;
//!
//! let client = Client::new("https://sis.example.org", "client-id", "client-secret")?;
//! let roster = client.homeroom_roster_for_teacher("4207").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Custom power queries installed on the server can be called through the
//! same machinery: implement [`PowerQuery`] on a parameter struct and hand
//! it to [`Client::run_query`].

pub mod client;
pub mod decode;
pub mod query;
pub mod records;
pub mod token;

pub use client::Client;
pub use decode::decode_records;
pub use query::{
    HomeroomRosterForTeacher, PowerQuery, SectionsForCourseNumber, SectionsForTeacher,
};
pub use records::{CourseSection, HomeroomRosterEntry, Student, Teacher};
pub use token::{AccessToken, Credentials, TokenManager};

pub use powerq_common::error::{
    AuthError, ClientError, ConfigError, DecodeError, Result, TransportError,
};
pub use powerq_common::http_client::HttpClient;

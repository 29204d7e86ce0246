//! Shared plumbing for the powerq client crates.
//!
//! This crate carries the pieces that do not depend on any particular
//! query: the [`HttpClient`] transport trait and the error taxonomy used
//! across the workspace.

pub mod error;
pub mod http_client;

pub use error::{AuthError, ClientError, ConfigError, DecodeError, Result, TransportError};
pub use http_client::HttpClient;

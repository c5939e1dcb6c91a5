//! Error taxonomy for the resource proxy.
//!
//! # Design
//! Each failure class gets its own variant so call sites can branch
//! without inspecting error types or messages:
//! - `InvalidMethod` and `NoTransport` are programmer errors — they fail
//!   fast, before any network effect or validation-state mutation.
//! - `Validation` is a soft, expected failure: an HTTP 422 whose field
//!   errors have already been merged into the shared validator. The
//!   variant carries the same errors so callers can show contextual
//!   messaging without reading the validator back.
//! - `Transport` is everything else: no server reply, or a non-422 error
//!   status. Validation state is left untouched apart from clearing the
//!   `processing` flag.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::http::TransportFailure;

/// Errors returned by proxy operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The requested verb is not in the supported set.
    #[error("`{0}` is not a valid request method, must be one of: `get`, `delete`, `head`, `post`, `put`, `patch`")]
    InvalidMethod(String),

    /// A submission was attempted with no transport bound to the proxy.
    #[error("no transport bound to the proxy, call `with_transport` before submitting")]
    NoTransport,

    /// The server rejected the request as semantically invalid (HTTP 422)
    /// and returned field-level errors.
    #[error("the server rejected the request with status {status} and {} field error(s)", .errors.len())]
    Validation {
        status: u16,
        errors: BTreeMap<String, Vec<String>>,
    },

    /// Connectivity failure or an error status other than 422.
    #[error("transport error: {0}")]
    Transport(TransportFailure),
}

impl ProxyError {
    /// Field errors attached to a `Validation` failure.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ProxyError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

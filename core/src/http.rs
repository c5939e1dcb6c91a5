//! HTTP verbs and the transport seam.
//!
//! # Design
//! The proxy never talks to the network directly. It hands a [`Method`], a
//! relative URL (path + query fragment) and an optional encoded body to a
//! [`Transport`] implementation and interprets the outcome. Implementations
//! return `Ok` for 2xx responses and `Err` for everything else; a failure
//! without a structured [`Response`] means the server never replied.
//!
//! `Method` is a closed enum, so an invalid verb cannot reach `submit` at
//! all — string entry points go through `FromStr`, which rejects unknown
//! verbs before any state mutation or network effect.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ProxyError;
use crate::payload::RequestBody;

/// Request verb. The set is closed: `get`, `delete`, `head`, `post`,
/// `put`, `patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Delete,
    Head,
    Post,
    Put,
    Patch,
}

impl Method {
    /// Lowercase verb name, as it appears on the wire and in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Method::Get),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            other => Err(ProxyError::InvalidMethod(other.to_string())),
        }
    }
}

/// A structured server reply.
///
/// Non-JSON bodies are carried as `Value::String` so callers always get
/// something inspectable.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

/// A failed transport call.
///
/// `response: None` signals a connectivity-level failure — the request
/// never produced a server reply. A present response carries the error
/// status and body for classification by the dispatcher.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub message: String,
    pub response: Option<Response>,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.response {
            Some(response) => write!(f, "{} (status {})", self.message, response.status),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for TransportFailure {}

/// Executes one verb-dispatched request.
///
/// `url` is relative (path plus query fragment); resolving it against a
/// base address is the implementation's concern. Implementations decide
/// success by status class: 2xx maps to `Ok`, anything else to `Err` with
/// the structured response attached.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&RequestBody>,
    ) -> Result<Response, TransportFailure>;
}

//! ureq-backed [`Transport`] implementation.
//!
//! # Design
//! The agent is configured with `http_status_as_error(false)` so 4xx/5xx
//! responses come back as data rather than `Err`; status classification
//! happens here, in one place: 2xx maps to `Ok`, anything else to a
//! [`TransportFailure`] carrying the structured response. Only errors at
//! the connection level (refused, DNS, timeouts) produce a failure with
//! no response attached.
//!
//! Bodies are parsed as JSON opportunistically; a body that is not JSON
//! is carried as a plain string value.

use serde_json::Value;
use ureq::typestate::WithBody;

use crate::http::{Method, Response, Transport, TransportFailure};
use crate::payload::RequestBody;

/// Synchronous transport over a [`ureq::Agent`].
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqTransport {
    /// Build a transport resolving relative URLs against `base_url`.
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&RequestBody>,
    ) -> Result<Response, TransportFailure> {
        let full_url = format!("{}{}", self.base_url, url);
        let result = match method {
            Method::Get => self.agent.get(&full_url).call(),
            Method::Delete => self.agent.delete(&full_url).call(),
            Method::Head => self.agent.head(&full_url).call(),
            Method::Post => send_with_body(self.agent.post(&full_url), body),
            Method::Put => send_with_body(self.agent.put(&full_url), body),
            Method::Patch => send_with_body(self.agent.patch(&full_url), body),
        };

        let mut raw = result.map_err(|err| TransportFailure {
            message: err.to_string(),
            response: None,
        })?;

        let status = raw.status().as_u16();
        let text = raw
            .body_mut()
            .read_to_string()
            .map_err(|err| TransportFailure {
                message: format!("failed to read response body: {err}"),
                response: None,
            })?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        let response = Response { status, body };

        if (200..300).contains(&status) {
            Ok(response)
        } else {
            Err(TransportFailure {
                message: format!("HTTP {status}"),
                response: Some(response),
            })
        }
    }
}

fn send_with_body(
    builder: ureq::RequestBuilder<WithBody>,
    body: Option<&RequestBody>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(RequestBody::Json(value)) => {
            let json = value.to_string();
            builder
                .content_type("application/json")
                .send(json.as_bytes())
        }
        Some(RequestBody::Multipart(form)) => {
            let content_type = form.content_type();
            builder
                .content_type(content_type.as_str())
                .send(&form.to_bytes()[..])
        }
        None => builder.send_empty(),
    }
}

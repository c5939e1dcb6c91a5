//! The resource proxy: CRUD operations mapped onto verb-dispatched
//! requests.
//!
//! # Design
//! One [`Proxy`] per resource collection. It owns its query parameters,
//! holds a clone of the [`SharedValidator`] for its request scope, and an
//! optional [`Transport`]. Every CRUD method routes through [`Proxy::submit`],
//! which runs the full pipeline: transport check, validation-state reset,
//! payload-encoding decision, query-string construction, dispatch, and
//! outcome classification.
//!
//! Submission is synchronous; the only blocking point is the transport
//! call itself. Concurrent submissions sharing a validator are not
//! coordinated (see the `validator` module notes).

use std::fmt::Display;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ProxyError;
use crate::http::{Method, Transport};
use crate::payload::{self, Payload};
use crate::query;
use crate::validator::{ErrorMap, SharedValidator};

/// Status the server uses to signal semantic validation failure.
const UNPROCESSABLE_ENTITY: u16 = 422;

/// Default top-level key holding field errors in a 422 body.
const DEFAULT_ERRORS_KEY: &str = "errors";

/// Client-side handle to one server-side resource collection.
pub struct Proxy {
    endpoint: String,
    parameters: Map<String, Value>,
    validator: SharedValidator,
    transport: Option<Arc<dyn Transport>>,
    errors_key: String,
}

impl Proxy {
    /// Create a proxy for `/{endpoint}` with a fresh validator and no
    /// transport. Bind a transport with [`Proxy::with_transport`] before
    /// submitting.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            parameters: Map::new(),
            validator: SharedValidator::new(),
            transport: None,
            errors_key: DEFAULT_ERRORS_KEY.to_string(),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share a validator with other proxies feeding the same form state.
    pub fn with_validator(mut self, validator: SharedValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Override the top-level key field errors are read from in a 422
    /// response body.
    pub fn with_errors_key(mut self, key: impl Into<String>) -> Self {
        self.errors_key = key.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn validator(&self) -> &SharedValidator {
        &self.validator
    }

    // --- parameter mutators (fluent) ---

    /// Merge the given keys in, overwriting existing ones.
    pub fn set_parameters(&mut self, parameters: Map<String, Value>) -> &mut Self {
        for (key, value) in parameters {
            self.parameters.insert(key, value);
        }
        self
    }

    /// Set a single parameter.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Parse a raw query fragment (comma arrays, dot paths, optional
    /// leading `?`) and merge the result in.
    pub fn set_parameters_from_str(&mut self, fragment: &str) -> &mut Self {
        self.set_parameters(query::parse(fragment))
    }

    /// Remove the named keys; an empty slice resets the whole store.
    pub fn remove_parameters(&mut self, keys: &[&str]) -> &mut Self {
        if keys.is_empty() {
            self.parameters = Map::new();
        } else {
            for key in keys {
                self.parameters.remove(*key);
            }
        }
        self
    }

    /// Remove one key; no-op if absent.
    pub fn remove_parameter(&mut self, key: &str) -> &mut Self {
        self.parameters.remove(key);
        self
    }

    // --- CRUD operations ---

    /// `get /{endpoint}`
    pub fn all(&self) -> Result<Value, ProxyError> {
        self.submit(Method::Get, &format!("/{}", self.endpoint), None)
    }

    /// `get /{endpoint}/{id}`
    pub fn find(&self, id: impl Display) -> Result<Value, ProxyError> {
        self.submit(Method::Get, &format!("/{}/{id}", self.endpoint), None)
    }

    /// `post /{endpoint}`
    pub fn post(&self, payload: Payload) -> Result<Value, ProxyError> {
        self.submit(Method::Post, &format!("/{}", self.endpoint), Some(payload))
    }

    /// Alias for [`Proxy::post`].
    pub fn store(&self, payload: Payload) -> Result<Value, ProxyError> {
        self.post(payload)
    }

    /// `put /{endpoint}/{id}`
    pub fn put(&self, id: impl Display, payload: Payload) -> Result<Value, ProxyError> {
        self.submit(Method::Put, &format!("/{}/{id}", self.endpoint), Some(payload))
    }

    /// `post /{endpoint}/{id}` with the payload's `_method` field forced
    /// to `put`, for transports and servers that cannot take binary
    /// bodies on an actual `put`.
    pub fn put_with_file(&self, id: impl Display, mut payload: Payload) -> Result<Value, ProxyError> {
        payload.set("_method", "put");
        self.submit(Method::Post, &format!("/{}/{id}", self.endpoint), Some(payload))
    }

    /// `patch /{endpoint}/{id}`
    pub fn patch(&self, id: impl Display, payload: Payload) -> Result<Value, ProxyError> {
        self.submit(Method::Patch, &format!("/{}/{id}", self.endpoint), Some(payload))
    }

    /// `delete /{endpoint}/{id}`
    pub fn delete(&self, id: impl Display) -> Result<Value, ProxyError> {
        self.submit(Method::Delete, &format!("/{}/{id}", self.endpoint), None)
    }

    // --- the pipeline ---

    /// Submit one request. On success resolves to the response body; on a
    /// 422 the field errors are merged into the shared validator before
    /// the `Validation` error is returned.
    pub fn submit(
        &self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
    ) -> Result<Value, ProxyError> {
        // Transport check precedes the state reset: a configuration error
        // must leave the validator untouched.
        let transport = self.transport.as_ref().ok_or(ProxyError::NoTransport)?;
        self.validator.begin_submission();

        let body = payload.as_ref().map(payload::encode);
        let url = format!("{}{}", path, query::stringify(&self.parameters));
        tracing::debug!(method = method.as_str(), url = %url, "submitting request");

        match transport.send(method, &url, body.as_ref()) {
            Ok(response) => {
                tracing::debug!(status = response.status, "request succeeded");
                self.validator.end_success();
                Ok(response.body)
            }
            Err(failure) => {
                let validation = failure
                    .response
                    .as_ref()
                    .filter(|response| response.status == UNPROCESSABLE_ENTITY)
                    .map(|response| extract_errors(&response.body, &self.errors_key));
                match validation {
                    Some(errors) => {
                        tracing::warn!(fields = errors.len(), "request failed validation");
                        self.validator.end_failure(Some(errors.clone()));
                        Err(ProxyError::Validation {
                            status: UNPROCESSABLE_ENTITY,
                            errors,
                        })
                    }
                    None => {
                        self.validator.end_failure(None);
                        Err(ProxyError::Transport(failure))
                    }
                }
            }
        }
    }
}

/// Pull the field-error mapping out of a 422 body. A missing key or an
/// unexpected shape yields an empty map — the failure is still treated as
/// a validation failure. A bare string message counts as a one-element
/// list.
fn extract_errors(body: &Value, errors_key: &str) -> ErrorMap {
    let mut errors = ErrorMap::new();
    let Some(fields) = body.get(errors_key).and_then(Value::as_object) else {
        return errors;
    };
    for (field, messages) in fields {
        let messages = match messages {
            Value::String(message) => vec![message.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        errors.insert(field.clone(), messages);
    }
    errors
}

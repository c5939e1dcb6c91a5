//! Request payloads, binary-attachment detection, and body encoding.
//!
//! # Design
//! A [`Payload`] is a tree of [`PayloadValue`]s whose leaves are ordinary
//! JSON scalars or tagged [`FileAttachment`]s. Tagging attachments in the
//! type replaces the original runtime "is this a file" probe: whether a
//! payload carries binary data is decided by construction, not by
//! inspecting the execution environment.
//!
//! [`encode`] picks the wire encoding: if the detection walk finds an
//! attachment the whole payload is flattened into a [`MultipartForm`]
//! (bracket-notation keys, one part per sequence element); otherwise the
//! payload serializes to plain JSON.
//!
//! # Detection walk
//! `has_files_deep` deliberately reproduces the historical traversal this
//! proxy has always shipped with:
//! - an object reports true only when a *direct* child is a file — it
//!   does not recurse into nested objects;
//! - an array reports true when a direct element is a file, otherwise it
//!   recurses into its *first* element only.
//!
//! An attachment hidden past that horizon (for example in the second
//! element of a nested array) is missed and serializes as JSON `null`.

use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

/// A binary attachment destined for a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// One node of a request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    File(FileAttachment),
    Array(Vec<PayloadValue>),
    Object(BTreeMap<String, PayloadValue>),
}

impl PayloadValue {
    fn is_file(&self) -> bool {
        matches!(self, PayloadValue::File(_))
    }

    /// JSON rendering of this node. File attachments have no JSON
    /// representation and degrade to `null`; they only reach this path
    /// when the detection walk missed them.
    fn to_json(&self) -> Value {
        match self {
            PayloadValue::Null | PayloadValue::File(_) => Value::Null,
            PayloadValue::Bool(b) => Value::Bool(*b),
            PayloadValue::Number(n) => Value::Number(n.clone()),
            PayloadValue::String(s) => Value::String(s.clone()),
            PayloadValue::Array(items) => {
                Value::Array(items.iter().map(PayloadValue::to_json).collect())
            }
            PayloadValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::String(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Number(value.into())
    }
}

impl From<FileAttachment> for PayloadValue {
    fn from(value: FileAttachment) -> Self {
        PayloadValue::File(value)
    }
}

impl From<Vec<PayloadValue>> for PayloadValue {
    fn from(value: Vec<PayloadValue>) -> Self {
        PayloadValue::Array(value)
    }
}

impl From<Value> for PayloadValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PayloadValue::Null,
            Value::Bool(b) => PayloadValue::Bool(b),
            Value::Number(n) => PayloadValue::Number(n),
            Value::String(s) => PayloadValue::String(s),
            Value::Array(items) => {
                PayloadValue::Array(items.into_iter().map(PayloadValue::from).collect())
            }
            Value::Object(map) => PayloadValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, PayloadValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// A request payload: the top-level mapping handed to `post`, `put`,
/// `patch` and friends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(BTreeMap<String, PayloadValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from a JSON object. Non-object values produce an
    /// empty payload.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(
                map.into_iter()
                    .map(|(key, value)| (key, PayloadValue::from(value)))
                    .collect(),
            ),
            _ => Self::default(),
        }
    }

    /// Set a field, overwriting any previous value. Fluent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON rendering of the whole payload.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    /// True when the detection walk finds a file attachment in any
    /// top-level value.
    pub fn has_files(&self) -> bool {
        self.0.values().any(has_files_deep)
    }
}

fn has_files_deep(value: &PayloadValue) -> bool {
    match value {
        PayloadValue::Null => false,
        PayloadValue::File(_) => true,
        PayloadValue::Object(map) => map.values().any(PayloadValue::is_file),
        PayloadValue::Array(items) => {
            if items.iter().any(PayloadValue::is_file) {
                return true;
            }
            items.first().map(has_files_deep).unwrap_or(false)
        }
        _ => false,
    }
}

/// An encoded request body, ready for a transport.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

/// Encode a payload for submission: multipart when attachments are
/// present, plain JSON otherwise.
pub fn encode(payload: &Payload) -> RequestBody {
    if payload.has_files() {
        RequestBody::Multipart(MultipartForm::from_payload(payload))
    } else {
        RequestBody::Json(payload.to_json())
    }
}

/// One flattened multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub data: PartData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartData {
    Text(String),
    File(FileAttachment),
}

/// A multipart/form-data body: ordered parts plus a generated boundary.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Flatten a payload into parts. Nested keys use bracket notation
    /// (`parent[child]`), sequences contribute one `key[]` part per
    /// element, scalars render as text, and `null` becomes an empty
    /// string.
    pub fn from_payload(payload: &Payload) -> Self {
        let mut parts = Vec::new();
        for (key, value) in &payload.0 {
            append_parts(&mut parts, key.clone(), value);
        }
        Self {
            boundary: format!("----ProxyFormBoundary{}", Uuid::new_v4().simple()),
            parts,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Value for the `Content-Type` request header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Standard multipart/form-data wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match &part.data {
                PartData::Text(text) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            part.name
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(text.as_bytes());
                }
                PartData::File(file) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            part.name, file.filename, file.content_type
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(&file.bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn append_parts(parts: &mut Vec<FormPart>, name: String, value: &PayloadValue) {
    let text = |name: String, text: String| FormPart {
        name,
        data: PartData::Text(text),
    };
    match value {
        PayloadValue::Null => parts.push(text(name, String::new())),
        PayloadValue::Bool(b) => parts.push(text(name, b.to_string())),
        PayloadValue::Number(n) => parts.push(text(name, n.to_string())),
        PayloadValue::String(s) => parts.push(text(name, s.clone())),
        PayloadValue::File(file) => parts.push(FormPart {
            name,
            data: PartData::File(file.clone()),
        }),
        PayloadValue::Array(items) => {
            for item in items {
                append_parts(parts, format!("{name}[]"), item);
            }
        }
        PayloadValue::Object(map) => {
            for (key, child) in map {
                append_parts(parts, format!("{name}[{key}]"), child);
            }
        }
    }
}

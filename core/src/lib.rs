//! Generic client-side resource proxy.
//!
//! # Overview
//! A [`Proxy`] maps CRUD-style operations on one named resource endpoint
//! (`all`, `find`, `store`, `put`, `patch`, `delete`, …) onto
//! verb-dispatched requests against a pluggable [`Transport`], while
//! transparently handling query-parameter state, multipart encoding when
//! binary attachments are present, and the bridging of server-side
//! validation failures (HTTP 422) into a [`SharedValidator`] a UI layer
//! can render from.
//!
//! # Design
//! - One `Proxy` per resource collection; it owns its parameters and
//!   shares a validator per request scope (explicit clones, no global
//!   singleton).
//! - The transport is a trait taking `(method, relative url, body)`, so
//!   the dispatch pipeline is testable without a network; a ureq-backed
//!   implementation ships as [`UreqTransport`].
//! - Payloads tag binary attachments in the type ([`FileAttachment`]),
//!   and the encoder switches the whole body to multipart when the
//!   detection walk finds one.
//! - Failure classes are explicit [`ProxyError`] variants: usage,
//!   configuration, validation (soft, merged into the validator), and
//!   transport.

pub mod error;
pub mod http;
pub mod payload;
pub mod proxy;
pub mod query;
pub mod transport;
pub mod validator;

pub use error::ProxyError;
pub use http::{Method, Response, Transport, TransportFailure};
pub use payload::{encode, FileAttachment, MultipartForm, Payload, PayloadValue, RequestBody};
pub use proxy::Proxy;
pub use transport::UreqTransport;
pub use validator::{ErrorMap, SharedValidator, Validator};

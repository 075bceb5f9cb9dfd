//! Handler outcome types.
//!
//! A handler finishes in exactly one of three ways: a success value, a
//! redirect, or a typed [`Error`]. Redirects are ordinary values here, not
//! unwinds; the dispatcher pattern-matches on [`Reply`] and encodes a
//! `302` with a `Location` header, bypassing JSON encoding entirely.

use crate::error::Error;
use crate::server::HttpResponse;
use serde_json::Value;

/// The successful outcome of a handler.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A plain success value, serialized as a JSON body with status 200.
    Json(Value),
    /// A success value with an explicit 2xx status (e.g. 201 for creation).
    JsonWithStatus(u16, Value),
    /// A redirect signal: encoded as 302 with a `Location` header and no
    /// JSON body.
    Redirect(String),
    /// A fully-formed response, passed through the encoder unchanged.
    Raw(HttpResponse),
}

impl Reply {
    /// A 200 JSON reply.
    #[must_use]
    pub fn ok(value: Value) -> Self {
        Reply::Json(value)
    }

    /// A 201 JSON reply.
    #[must_use]
    pub fn created(value: Value) -> Self {
        Reply::JsonWithStatus(201, value)
    }

    /// A redirect to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Reply::Redirect(location.into())
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

/// What every route action returns.
pub type HandlerResult = Result<Reply, Error>;

//! Error taxonomy for the request lifecycle.
//!
//! Components below the dispatcher never produce HTTP responses themselves;
//! they fail with a typed [`Error`] and let the dispatcher translate it at
//! the single outermost catch point. Redirects are not errors; they travel
//! as [`crate::reply::Reply::Redirect`] values.

use serde_json::{json, Value};

/// A typed failure produced somewhere in the request lifecycle.
///
/// Each variant maps to a fixed HTTP status:
///
/// | variant      | status | meaning                                           |
/// |--------------|--------|---------------------------------------------------|
/// | `Http`       | as given | a handler deliberately signalled a status code  |
/// | `Validation` | 400    | well-formed input rejected by a declared schema   |
/// | `Parse`      | 400    | malformed body JSON or undeclared query params    |
/// | `Auth`       | 401    | missing/malformed bearer token or failed verification |
/// | `Internal`   | 500    | any other failure; logged server-side             |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A handler deliberately signalled a specific status code and message.
    Http { status: u16, message: String },
    /// Path/query/body failed schema validation (field-level detail in the message).
    Validation(String),
    /// The body was not well-formed JSON, or query parameters arrived for a
    /// route that declares no query shape.
    Parse(String),
    /// Missing/malformed bearer token, or signature/issuer check failure.
    Auth(String),
    /// Any other failure; surfaced as 500 and logged with enough context to diagnose.
    Internal(String),
}

impl Error {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// The sentinel failure for routes whose action was never attached
    /// (or was reset by a schema change).
    pub fn not_implemented() -> Self {
        Error::Http {
            status: 501,
            message: "Not implemented".to_string(),
        }
    }

    /// HTTP status code this error is surfaced with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Error::Http { status, .. } => *status,
            Error::Validation(_) | Error::Parse(_) => 400,
            Error::Auth(_) => 401,
            Error::Internal(_) => 500,
        }
    }

    /// Human-readable message, as placed in the `{"error": ...}` payload.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Error::Http { message, .. }
            | Error::Validation(message)
            | Error::Parse(message)
            | Error::Auth(message)
            | Error::Internal(message) => message,
        }
    }

    /// Short kind label used in server-side log events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Http { .. } => "http",
            Error::Validation(_) => "validation",
            Error::Parse(_) => "parse",
            Error::Auth(_) => "auth",
            Error::Internal(_) => "internal",
        }
    }

    /// The `{"error": message}` wire payload.
    #[must_use]
    pub fn to_body(&self) -> Value {
        json!({ "error": self.message() })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.kind(), self.status(), self.message())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::validation("x").status(), 400);
        assert_eq!(Error::parse("x").status(), 400);
        assert_eq!(Error::auth("x").status(), 401);
        assert_eq!(Error::internal("x").status(), 500);
        assert_eq!(Error::http(418, "teapot").status(), 418);
        assert_eq!(Error::not_implemented().status(), 501);
    }

    #[test]
    fn test_body_shape() {
        let body = Error::auth("Missing bearer token").to_body();
        assert_eq!(body["error"], "Missing bearer token");
    }
}

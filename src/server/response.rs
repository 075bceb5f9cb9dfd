use http_body_util::Full;
use hyper::body::Bytes;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::error;

/// Maximum inline headers before heap allocation.
/// Responses from this layer carry few headers (content type + CORS).
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
pub type HeaderVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// A fully-formed response: status, headers and body bytes.
///
/// Everything the dispatcher produces (handler successes, redirects,
/// encoded errors) ends up as one of these before it is written to the
/// wire.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with no body and no headers.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// A JSON response.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
        Self {
            status,
            headers,
            body: serde_json::to_vec(body).unwrap_or_default(),
        }
    }

    /// An `{"error": message}` response.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// A 302 redirect carrying a `Location` header and no JSON body.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        let mut response = Self::empty(302);
        response.set_header("Location", location.into());
        response
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
    }

    /// Convert into a hyper response for the wire.
    #[must_use]
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut builder = hyper::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        match builder.body(Full::new(Bytes::from(self.body))) {
            Ok(response) => response,
            Err(e) => {
                // A handler smuggled an invalid header name/value into a raw
                // response; degrade to a plain 500 rather than drop the
                // connection.
                error!(error = %e, "Failed to assemble response; returning 500");
                let mut fallback = hyper::Response::new(Full::new(Bytes::from_static(
                    br#"{"error":"Internal server error"}"#,
                )));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback.headers_mut().insert(
                    http::header::CONTENT_TYPE,
                    http::header::HeaderValue::from_static("application/json"),
                );
                fallback
            }
        }
    }
}

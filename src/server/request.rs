use http::Method;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// The request body as this layer saw it on the wire.
///
/// GET requests carry no body in this protocol, so their body is never
/// read. For mutating methods the distinction between `Empty` and
/// `Invalid` matters: a missing body defaults to the empty record at
/// validation time, while malformed JSON is a parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body bytes were present (or the method never carries one).
    Empty,
    /// Well-formed JSON.
    Json(Value),
    /// Bytes were present but were not well-formed JSON.
    Invalid(String),
}

/// Parsed HTTP request data consumed by the dispatcher.
///
/// Constructed fresh per incoming request and discarded after the handler
/// returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// HTTP headers (lowercase names).
    pub headers: HashMap<String, String>,
    /// Parsed query string parameters (raw strings; typing is the schema
    /// validator's job).
    pub query: HashMap<String, String>,
    /// Request body.
    pub body: RequestBody,
}

impl ParsedRequest {
    /// A bare request, mainly for constructing test traffic.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            query: HashMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Attach a header (name is lowercased, as on the wire path).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }
}

/// Parse query string parameters, URL-decoding names and values.
#[must_use]
pub fn parse_query_params(query: Option<&str>) -> HashMap<String, String> {
    match query {
        Some(q) => url::form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Extract everything the dispatcher needs from a raw hyper request.
pub async fn parse_request(req: hyper::Request<hyper::body::Incoming>) -> ParsedRequest {
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let query = parse_query_params(parts.uri.query());

    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(value.as_bytes()).to_string(),
            )
        })
        .collect();

    debug!(
        header_count = headers.len(),
        query_count = query.len(),
        "Headers and query params extracted"
    );

    let body = if method == Method::GET {
        RequestBody::Empty
    } else {
        match body.collect().await {
            Ok(collected) => {
                let bytes = collected.to_bytes();
                if bytes.is_empty() {
                    RequestBody::Empty
                } else {
                    match serde_json::from_slice::<Value>(&bytes) {
                        Ok(value) => {
                            debug!(body_size_bytes = bytes.len(), "JSON body parsed");
                            RequestBody::Json(value)
                        }
                        Err(e) => {
                            debug!(body_size_bytes = bytes.len(), error = %e, "JSON body parse failed");
                            RequestBody::Invalid(e.to_string())
                        }
                    }
                }
            }
            Err(e) => RequestBody::Invalid(format!("failed to read body: {e}")),
        }
    };

    info!(method = %method, path = %path, "HTTP request parsed");

    ParsedRequest {
        method,
        path,
        headers,
        query,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params(Some("x=1&y=2"));
        assert_eq!(q.get("x"), Some(&"1".to_string()));
        assert_eq!(q.get("y"), Some(&"2".to_string()));
    }

    #[test]
    fn test_parse_query_params_decodes() {
        let q = parse_query_params(Some("name=a%20b"));
        assert_eq!(q.get("name"), Some(&"a b".to_string()));
    }

    #[test]
    fn test_no_query_string() {
        assert!(parse_query_params(None).is_empty());
    }
}

use crate::server::HttpResponse;
use http::Method;

/// CORS (Cross-Origin Resource Sharing) policy.
///
/// Answers preflight `OPTIONS` requests and stamps CORS headers onto every
/// outgoing response. Configurable with allowed origins, headers and
/// methods.
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl CorsPolicy {
    /// Create a policy with specific configuration.
    #[must_use]
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
        }
    }

    /// The response for a preflight `OPTIONS` request: always 200 with the
    /// policy's headers and no body, regardless of route.
    #[must_use]
    pub fn preflight(&self) -> HttpResponse {
        let mut response = HttpResponse::empty(200);
        self.apply(&mut response);
        response
    }

    /// Stamp the policy's headers onto a response.
    pub fn apply(&self, response: &mut HttpResponse) {
        response.set_header("Access-Control-Allow-Origin", self.allowed_origins.join(", "));
        response.set_header("Access-Control-Allow-Headers", self.allowed_headers.join(", "));
        response.set_header(
            "Access-Control-Allow-Methods",
            self.allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
}

/// Permissive policy suitable for serverless functions fronted by a
/// trusted gateway: all origins, the headers clients actually send, and
/// the methods routes can declare.
impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_headers: vec![
                "Authorization".into(),
                "Content-Type".into(),
                "X-Client-Info".into(),
            ],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_is_200_with_cors_headers() {
        let response = CorsPolicy::default().preflight();
        assert_eq!(response.status, 200);
        assert_eq!(response.get_header("Access-Control-Allow-Origin"), Some("*"));
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_apply_stamps_all_three_headers() {
        let mut response = HttpResponse::empty(204);
        CorsPolicy::default().apply(&mut response);
        assert!(response.get_header("Access-Control-Allow-Headers").is_some());
        assert!(response
            .get_header("Access-Control-Allow-Methods")
            .is_some_and(|m| m.contains("PATCH")));
    }
}

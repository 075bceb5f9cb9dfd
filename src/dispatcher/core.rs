//! Dispatcher core module - the per-request state machine.

use crate::error::Error;
use crate::ids::RequestId;
use crate::middleware::CorsPolicy;
use crate::reply::{HandlerResult, Reply};
use crate::route::BodySpec;
use crate::router::RouteSet;
use crate::security::Authenticator;
use crate::server::{HttpResponse, ParsedRequest};
use crate::validator::{validate_body, validate_path_params, validate_query};
use http::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Validated, typed request data passed to a route action.
///
/// Path and query parameters have already been coerced and checked against
/// the route's declared shapes; the body has passed its schema. Constructed
/// fresh per request and discarded after the handler returns.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Correlation id for this request's log events.
    pub id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path as received.
    pub path: String,
    /// Registered name of the matched route.
    pub route: String,
    /// Validated path parameters.
    pub params: Map<String, Value>,
    /// Validated query parameters.
    pub query: Map<String, Value>,
    /// Validated body (`Null` for GET routes).
    pub body: Value,
}

impl HandlerRequest {
    /// Get a validated path parameter by name.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get a validated query parameter by name.
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }
}

/// Owns the registered route table for one function namespace and drives
/// each inbound request through the lifecycle:
///
/// ```text
/// Received → OPTIONS? (CORS preflight short-circuit)
///          → RouteResolution (first match wins)
///          → Authentication (unless the route opted out)
///          → InputValidation (path, query, body)
///          → HandlerInvocation
///          → ResponseEncoding
/// ```
///
/// Every failure below this point is a typed [`Error`]; this is the single
/// outermost place where errors become HTTP responses.
pub struct Dispatcher {
    routes: Arc<RouteSet>,
    auth: Arc<Authenticator>,
    cors: CorsPolicy,
}

impl Dispatcher {
    /// Create a dispatcher for exactly one namespace's route table.
    #[must_use]
    pub fn new(routes: RouteSet, auth: Authenticator) -> Self {
        Self {
            routes: Arc::new(routes),
            auth: Arc::new(auth),
            cors: CorsPolicy::default(),
        }
    }

    /// Replace the default permissive CORS policy.
    #[must_use]
    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }

    #[must_use]
    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }

    /// Handle one request end to end, always producing a response.
    pub async fn dispatch(&self, request: ParsedRequest) -> HttpResponse {
        let id = RequestId::new();

        // OPTIONS is answered before any route logic: preflights get 200
        // with permissive cross-origin headers regardless of route.
        if request.method == Method::OPTIONS {
            debug!(request_id = %id, path = %request.path, "CORS preflight short-circuit");
            return self.cors.preflight();
        }

        let outcome = self.run(id, request).await;
        let mut response = encode(id, outcome);
        self.cors.apply(&mut response);
        response
    }

    /// The fallible stages of the lifecycle; errors converge at `encode`.
    async fn run(&self, id: RequestId, request: ParsedRequest) -> HandlerResult {
        let matched = self
            .routes
            .resolve(&request.method, &request.path)
            .ok_or_else(|| Error::http(405, "Method or route not allowed"))?;
        let route = Arc::clone(&matched.route);

        let auth = if route.auth_disabled() {
            None
        } else {
            Some(self.auth.authenticate(&request.headers).await?)
        };

        let params = validate_path_params(&matched.path_params, route.path_schema())?;
        let query = validate_query(&request.query, route.query_schema())?;
        let body = match route.body() {
            BodySpec::None => Value::Null,
            BodySpec::Schema(schema) => validate_body(&request.body, schema)?,
        };

        let handler_request = HandlerRequest {
            id,
            method: request.method,
            path: request.path,
            route: matched.name.clone(),
            params,
            query,
            body,
        };

        info!(
            request_id = %id,
            route = %matched.name,
            method = %handler_request.method,
            path = %handler_request.path,
            authenticated = auth.is_some(),
            "Request dispatched to handler"
        );

        route.action_ref().invoke(handler_request, auth).await
    }
}

/// Turn a handler outcome into a response.
///
/// Redirects are recognized before generic error handling and bypass JSON
/// encoding entirely; raw responses pass through unchanged; everything else
/// is serialized as JSON. Unclassified errors are logged server-side with
/// enough context to diagnose.
fn encode(id: RequestId, outcome: HandlerResult) -> HttpResponse {
    match outcome {
        Ok(Reply::Json(value)) => HttpResponse::json(200, &value),
        Ok(Reply::JsonWithStatus(status, value)) => HttpResponse::json(status, &value),
        Ok(Reply::Redirect(location)) => {
            debug!(request_id = %id, location = %location, "Redirect signalled");
            HttpResponse::redirect(location)
        }
        Ok(Reply::Raw(response)) => response,
        Err(error) => {
            match &error {
                Error::Internal(message) => {
                    error!(
                        request_id = %id,
                        kind = error.kind(),
                        message = %message,
                        "Unclassified handler error"
                    );
                }
                other => {
                    warn!(
                        request_id = %id,
                        kind = other.kind(),
                        status = other.status(),
                        message = other.message(),
                        "Request failed"
                    );
                }
            }
            HttpResponse::error(error.status(), error.message())
        }
    }
}

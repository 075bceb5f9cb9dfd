//! # fnroute
//!
//! **fnroute** is a minimal HTTP routing and request-dispatch layer for
//! small serverless functions. Each function exposes one or more routes;
//! each route accepts a method, an optional parameterized path, optional
//! query parameters and (for non-GET methods) a JSON body. The layer
//! resolves an incoming request to a registered route, validates and
//! coerces its inputs against declared JSON Schemas, optionally
//! authenticates the caller via a bearer token, invokes the handler, and
//! serializes the result (or a structured error, or a redirect) into an
//! HTTP response.
//!
//! ## Architecture
//!
//! - **[`router`]**: path pattern matching (`/users/:id`) with parameter
//!   extraction, and the per-namespace route table (first match wins, in
//!   registration order).
//! - **[`route`]**: the chainable route descriptor: each setter returns a
//!   new descriptor, and schema changes reset the attached action to a
//!   "not implemented" sentinel so a stale handler can never run against a
//!   shape it wasn't written for.
//! - **[`validator`]**: coercion and JSON Schema evaluation for path
//!   parameters, query parameters and bodies, with parse failures and
//!   schema rejections reported as distinct kinds.
//! - **[`security`]**: bearer-token verification against the identity
//!   provider's JWKS, with a process-wide signing-key cache; authenticated
//!   handlers receive a principal and a credential-scoped data-access
//!   handle.
//! - **[`dispatcher`]**: the per-request state machine: CORS preflight,
//!   route resolution, conditional authentication, input validation,
//!   handler invocation, response encoding. All errors surface here and
//!   nowhere else.
//! - **[`server`]**: hyper-based request parsing and the tokio accept
//!   loop; every request is an independent asynchronous task.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fnroute::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     fnroute::init_tracing();
//!
//!     let routes = RouteSet::define("profiles", vec![
//!         ("get_profile", Route::get_with_params("/users/:id", json!({
//!                 "type": "object",
//!                 "properties": { "id": { "type": "integer" } },
//!                 "required": ["id"]
//!             }))
//!             .action(|req, auth| async move {
//!                 Ok(Reply::ok(json!({
//!                     "id": req.params["id"],
//!                     "requested_by": auth.principal.subject,
//!                 })))
//!             })),
//!         ("ping", Route::get("/ping")
//!             .with_auth_disabled()
//!             .public_action(|_req| async move { Ok(Reply::ok(json!({ "pong": true }))) })),
//!     ]);
//!
//!     let auth = AuthConfig::from_env()?;
//!     let service = ServiceConfig::from_env()?;
//!     let keys = Arc::new(JwksKeyStore::new(auth.jwks_url.clone()));
//!     let dispatcher = Dispatcher::new(routes, Authenticator::new(auth, service, keys));
//!
//!     fnroute::serve(dispatcher, ([0, 0, 0, 0], 8080).into()).await
//! }
//! ```
//!
//! ## Error protocol
//!
//! Handlers return `Result<Reply, Error>`. Successes become 2xx JSON
//! responses (or 302 redirects, or raw passthrough); every [`Error`]
//! becomes `{"error": message}` with its taxonomy status. Nothing below
//! the dispatcher writes HTTP.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod reply;
pub mod route;
pub mod router;
pub mod security;
pub mod server;
pub mod typed;
pub mod validator;

pub use config::{AuthConfig, ServiceConfig};
pub use dispatcher::{Dispatcher, HandlerRequest};
pub use error::Error;
pub use reply::{HandlerResult, Reply};
pub use route::Route;
pub use router::RouteSet;
pub use security::{AuthContext, Authenticator, DataAccess, JwksKeyStore, Principal};
pub use server::{serve, HttpResponse, ParsedRequest};

/// The types a function crate typically needs in scope.
pub mod prelude {
    pub use crate::config::{AuthConfig, ServiceConfig};
    pub use crate::dispatcher::{Dispatcher, HandlerRequest};
    pub use crate::error::Error;
    pub use crate::reply::{HandlerResult, Reply};
    pub use crate::route::Route;
    pub use crate::router::RouteSet;
    pub use crate::security::{AuthContext, Authenticator, JwksKeyStore};
}

/// Install a `tracing` subscriber reading `RUST_LOG`, once.
///
/// Safe to call from multiple places (later calls are no-ops), which keeps
/// test setup simple.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

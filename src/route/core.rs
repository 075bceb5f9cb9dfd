//! Route descriptor and its chainable builder.

use crate::dispatcher::HandlerRequest;
use crate::error::Error;
use crate::reply::HandlerResult;
use crate::router::PathPattern;
use crate::security::AuthContext;
use crate::validator::{empty_record, SchemaSpec};
use http::Method;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by route actions.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

type AuthedFn = dyn Fn(HandlerRequest, AuthContext) -> HandlerFuture + Send + Sync;
type PublicFn = dyn Fn(HandlerRequest) -> HandlerFuture + Send + Sync;

/// The handler attached to a route.
///
/// Authenticated and public actions are distinct variants so that a public
/// route's handler structurally cannot receive a principal or data-access
/// handle it does not have.
#[derive(Clone)]
pub enum Action {
    /// The sentinel: no handler attached yet, or the previous handler was
    /// invalidated by a schema change. Invoking it fails with 501.
    NotImplemented,
    /// Handler for a route with authentication enabled.
    Authed(Arc<AuthedFn>),
    /// Handler for a route that opted out of authentication.
    Public(Arc<PublicFn>),
}

impl Action {
    /// Run the action, producing the sentinel failure when none is attached.
    pub async fn invoke(
        &self,
        request: HandlerRequest,
        auth: Option<AuthContext>,
    ) -> HandlerResult {
        match (self, auth) {
            (Action::Authed(f), Some(ctx)) => f(request, ctx).await,
            (Action::Public(f), None) => f(request).await,
            (Action::NotImplemented, _) => Err(Error::not_implemented()),
            // The builder makes these unrepresentable; fail loudly if a
            // descriptor was constructed behind its back.
            (Action::Authed(_), None) => Err(Error::internal(
                "authenticated action invoked without an authenticated context",
            )),
            (Action::Public(_), Some(_)) => Err(Error::internal(
                "public action invoked with an authenticated context",
            )),
        }
    }
}

/// Declared request-body shape.
#[derive(Debug, Clone)]
pub enum BodySpec {
    /// GET routes carry no body in this protocol; the body stage is skipped.
    None,
    /// Mutating routes validate their body against a JSON Schema
    /// (defaulting to the empty record).
    Schema(SchemaSpec),
}

/// One method+pattern endpoint: an immutable-per-step, chainable
/// configuration value.
///
/// Every setter consumes the descriptor and returns a new one; a descriptor
/// handed out earlier is never mutated in place. The handler's input type
/// is derived from the declared shapes, so replacing any schema (or the
/// auth mode) resets the action to the "not implemented" sentinel: a stale
/// handler must not run against a shape it was not written for. `action`
/// must therefore be the terminal call in a chain.
///
/// ```
/// use fnroute::route::Route;
/// use fnroute::reply::Reply;
/// use serde_json::json;
///
/// let route = Route::get_with_params("/users/:id", json!({
///         "type": "object",
///         "properties": { "id": { "type": "integer" } },
///         "required": ["id"]
///     }))
///     .action(|req, auth| async move {
///         Ok(Reply::ok(json!({ "id": req.params["id"], "sub": auth.principal.subject })))
///     });
/// assert!(route.has_action());
/// ```
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    path_schema: Option<SchemaSpec>,
    query_schema: Option<SchemaSpec>,
    body: BodySpec,
    auth_disabled: bool,
    action: Action,
}

impl Route {
    fn new(method: Method, pattern: &str, params: Option<Value>) -> Self {
        let pattern = PathPattern::parse(pattern);
        let path_schema = match params {
            Some(schema) => {
                if !pattern.has_params() {
                    panic!(
                        "pattern {:?} declares a parameter shape but has no :name segments",
                        pattern.as_str()
                    );
                }
                Some(SchemaSpec::compile(schema))
            }
            None => {
                if pattern.has_params() {
                    panic!(
                        "pattern {:?} contains parameter segments; use the *_with_params constructor",
                        pattern.as_str()
                    );
                }
                None
            }
        };
        let body = if method == Method::GET {
            BodySpec::None
        } else {
            BodySpec::Schema(empty_record())
        };
        Self {
            method,
            pattern,
            path_schema,
            query_schema: None,
            body,
            auth_disabled: false,
            action: Action::NotImplemented,
        }
    }

    /// A GET route with a fixed, parameter-free path.
    ///
    /// # Panics
    ///
    /// Panics if the pattern contains a `:name` parameter segment; use
    /// [`Route::get_with_params`] for parameterized paths.
    #[must_use]
    pub fn get(pattern: &str) -> Self {
        Self::new(Method::GET, pattern, None)
    }

    /// A GET route with a parameterized path and the declared shape of its
    /// parameters.
    #[must_use]
    pub fn get_with_params(pattern: &str, params: Value) -> Self {
        Self::new(Method::GET, pattern, Some(params))
    }

    /// A POST route with a fixed, parameter-free path.
    #[must_use]
    pub fn post(pattern: &str) -> Self {
        Self::new(Method::POST, pattern, None)
    }

    /// A POST route with a parameterized path.
    #[must_use]
    pub fn post_with_params(pattern: &str, params: Value) -> Self {
        Self::new(Method::POST, pattern, Some(params))
    }

    /// A PATCH route with a fixed, parameter-free path.
    #[must_use]
    pub fn patch(pattern: &str) -> Self {
        Self::new(Method::PATCH, pattern, None)
    }

    /// A PATCH route with a parameterized path.
    #[must_use]
    pub fn patch_with_params(pattern: &str, params: Value) -> Self {
        Self::new(Method::PATCH, pattern, Some(params))
    }

    /// A PUT route with a fixed, parameter-free path.
    #[must_use]
    pub fn put(pattern: &str) -> Self {
        Self::new(Method::PUT, pattern, None)
    }

    /// A PUT route with a parameterized path.
    #[must_use]
    pub fn put_with_params(pattern: &str, params: Value) -> Self {
        Self::new(Method::PUT, pattern, Some(params))
    }

    /// A DELETE route with a fixed, parameter-free path.
    #[must_use]
    pub fn delete(pattern: &str) -> Self {
        Self::new(Method::DELETE, pattern, None)
    }

    /// A DELETE route with a parameterized path.
    #[must_use]
    pub fn delete_with_params(pattern: &str, params: Value) -> Self {
        Self::new(Method::DELETE, pattern, Some(params))
    }

    /// Replace the declared path-parameter shape. Resets the action.
    ///
    /// # Panics
    ///
    /// Panics if the pattern has no parameter segments.
    #[must_use]
    pub fn with_path_schema(mut self, schema: Value) -> Self {
        if !self.pattern.has_params() {
            panic!(
                "pattern {:?} has no :name segments to declare a shape for",
                self.pattern.as_str()
            );
        }
        self.path_schema = Some(SchemaSpec::compile(schema));
        self.action = Action::NotImplemented;
        self
    }

    /// Declare the query-parameter shape. Resets the action.
    #[must_use]
    pub fn with_query_schema(mut self, schema: Value) -> Self {
        self.query_schema = Some(SchemaSpec::compile(schema));
        self.action = Action::NotImplemented;
        self
    }

    /// Declare the request-body shape. Resets the action.
    ///
    /// # Panics
    ///
    /// Panics for GET routes: GET requests carry no body in this protocol,
    /// so attaching a body shape is a construction-time error.
    #[must_use]
    pub fn with_body_schema(mut self, schema: Value) -> Self {
        if self.method == Method::GET {
            panic!("GET routes carry no body; cannot attach a body schema");
        }
        self.body = BodySpec::Schema(SchemaSpec::compile(schema));
        self.action = Action::NotImplemented;
        self
    }

    /// Opt this route out of authentication, making it public.
    ///
    /// Opting out is explicit and per-route, never an implicit default. It
    /// also changes the handler's parameter types (the principal and
    /// data-access handle become absent), so any previously attached action
    /// is reset and must be re-attached via [`Route::public_action`].
    #[must_use]
    pub fn with_auth_disabled(mut self) -> Self {
        self.auth_disabled = true;
        self.action = Action::NotImplemented;
        self
    }

    /// Attach the handler for an authenticated route. Must be the terminal
    /// call in the chain.
    ///
    /// # Panics
    ///
    /// Panics if the route has authentication disabled; use
    /// [`Route::public_action`] instead.
    #[must_use]
    pub fn action<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HandlerRequest, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        if self.auth_disabled {
            panic!("route has authentication disabled; attach a handler with public_action()");
        }
        self.action = Action::Authed(Arc::new(move |req, ctx| Box::pin(handler(req, ctx))));
        self
    }

    /// Attach the handler for a public (auth-disabled) route. Must be the
    /// terminal call in the chain.
    ///
    /// # Panics
    ///
    /// Panics if the route still has authentication enabled.
    #[must_use]
    pub fn public_action<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        if !self.auth_disabled {
            panic!("route has authentication enabled; disable it first or attach with action()");
        }
        self.action = Action::Public(Arc::new(move |req| Box::pin(handler(req))));
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn path_schema(&self) -> Option<&SchemaSpec> {
        self.path_schema.as_ref()
    }

    #[must_use]
    pub fn query_schema(&self) -> Option<&SchemaSpec> {
        self.query_schema.as_ref()
    }

    #[must_use]
    pub fn body(&self) -> &BodySpec {
        &self.body
    }

    #[must_use]
    pub fn auth_disabled(&self) -> bool {
        self.auth_disabled
    }

    #[must_use]
    pub fn action_ref(&self) -> &Action {
        &self.action
    }

    /// Whether a real handler is attached (false means the sentinel).
    #[must_use]
    pub fn has_action(&self) -> bool {
        !matches!(self.action, Action::NotImplemented)
    }
}

//! Router core module - hot path for route resolution.

use crate::route::Route;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path/query parameters before heap allocation.
/// Most routes have ≤4 path params (e.g., `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
/// Uses `SmallVec` to avoid heap allocation for routes with ≤8 params.
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// One segment of a parsed route pattern: an exact literal or a named
/// parameter marker (`:name`).
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern of the form `/seg1/:param1/seg2`.
///
/// Parsed once at registration; matching a request path is a segmentwise
/// walk with no allocation beyond the extracted parameter values.
///
/// Normalization: a single leading slash is ensured and trailing slashes
/// are stripped, so `/a/b/` and `/a/b` are the same pattern. The root
/// pattern `/` is the distinguished base case and only matches the root
/// path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern string.
    ///
    /// # Panics
    ///
    /// Panics if a parameter segment has an empty name (a bare `:`): that is
    /// a registration-time configuration error and must fail loudly rather
    /// than silently never match.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let raw = normalize(pattern);
        let segments = if raw == "/" {
            Vec::new()
        } else {
            raw.split('/')
                .filter(|s| !s.is_empty())
                .map(|seg| {
                    if let Some(name) = seg.strip_prefix(':') {
                        if name.is_empty() {
                            panic!(
                                "route pattern {pattern:?} has a parameter segment with an empty name"
                            );
                        }
                        Segment::Param(name.to_string())
                    } else {
                        Segment::Literal(seg.to_string())
                    }
                })
                .collect()
        };
        Self { raw, segments }
    }

    /// The normalized pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains any `:name` parameter segments.
    #[must_use]
    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Ordered names of the pattern's parameter segments.
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match a concrete request path against this pattern.
    ///
    /// Returns the extracted parameters on success. Parameter values are
    /// captured verbatim; any decoding or typing is the schema validator's
    /// job, not the matcher's.
    ///
    /// The walk requires exactly equal segment counts: no partial matches,
    /// no wildcards. `/a/:id` matches neither `/a/b/c` nor `/a`.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let path = normalize(path);

        // Base case: the root pattern only matches the root path.
        if self.raw == "/" {
            return (path == "/").then(ParamVec::new);
        }

        // Fast path: no parameters means plain string equality.
        if !self.has_params() {
            return (self.raw == path).then(ParamVec::new);
        }

        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = ParamVec::new();
        for (segment, part) in self.segments.iter().zip(path_segments) {
            match segment {
                Segment::Param(name) => params.push((name.clone(), part.to_string())),
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
            }
        }
        Some(params)
    }
}

/// Ensure a single leading slash and strip any trailing slash, keeping the
/// canonical root `/` intact.
fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Result of successfully resolving a request to a registered route.
#[derive(Clone)]
pub struct RouteMatch {
    /// Registered name of the matched route.
    pub name: String,
    /// The matched route descriptor (`Arc` to avoid expensive clones).
    pub route: Arc<Route>,
    /// Path parameters extracted from the URL, verbatim strings.
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a `HashMap`.
    /// Note: this allocates - use `get_path_param()` in hot paths instead.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params.iter().cloned().collect()
    }
}

/// The registered route table for one function namespace.
///
/// Built once at process start and treated as read-only thereafter;
/// concurrent requests only ever read it.
pub struct RouteSet {
    namespace: String,
    routes: Vec<(String, Arc<Route>)>,
}

impl RouteSet {
    /// Build the route table for a function namespace from named route
    /// descriptors, preserving registration order.
    ///
    /// # Panics
    ///
    /// Panics on startup-time configuration errors: an empty or slashed
    /// namespace, a duplicate route name, or a duplicate `(method, pattern)`
    /// registration.
    #[must_use]
    pub fn define(namespace: &str, routes: Vec<(&str, Route)>) -> Self {
        if namespace.is_empty() || namespace.contains('/') {
            panic!("invalid function namespace {namespace:?}: must be a single non-empty path segment");
        }

        let mut table: Vec<(String, Arc<Route>)> = Vec::with_capacity(routes.len());
        for (name, route) in routes {
            if table.iter().any(|(existing, _)| existing == name) {
                panic!("duplicate route name {name:?} in namespace {namespace:?}");
            }
            if table.iter().any(|(_, existing)| {
                existing.method() == route.method()
                    && existing.pattern().as_str() == route.pattern().as_str()
            }) {
                panic!(
                    "duplicate registration for {} {} in namespace {namespace:?}",
                    route.method(),
                    route.pattern().as_str()
                );
            }
            table.push((name.to_string(), Arc::new(route)));
        }

        info!(
            namespace = %namespace,
            routes_count = table.len(),
            "Routing table loaded"
        );

        Self {
            namespace: namespace.to_string(),
            routes: table,
        }
    }

    /// The single function namespace this table serves.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Absorb another table into this one.
    ///
    /// # Panics
    ///
    /// Exactly one namespace may be served per table; merging a table built
    /// for a different namespace is a startup-time configuration error.
    #[must_use]
    pub fn merged_with(mut self, other: RouteSet) -> Self {
        if other.namespace != self.namespace {
            panic!(
                "cannot merge route tables for different namespaces ({:?} vs {:?})",
                self.namespace, other.namespace
            );
        }
        self.routes.extend(other.routes);
        self
    }

    /// Strip the namespace base segment from a request path, if present.
    ///
    /// Requests arrive as `/namespace/rest`; patterns are registered without
    /// the namespace. Paths that do not carry the prefix are matched as-is.
    #[must_use]
    pub fn local_path<'a>(&self, path: &'a str) -> &'a str {
        if let Some(rest) = path
            .strip_prefix('/')
            .and_then(|p| p.strip_prefix(self.namespace.as_str()))
        {
            if rest.is_empty() {
                return "/";
            }
            if rest.starts_with('/') {
                return rest;
            }
        }
        path
    }

    /// Resolve a request to a registered route.
    ///
    /// Scans the table in registration order and selects the **first** route
    /// whose method equals the request method and whose pattern matches the
    /// request path. Overlapping patterns are therefore resolved by
    /// registration order, not by specificity.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let local = self.local_path(path);
        debug!(method = %method, path = %path, local = %local, "Route match attempt");

        for (name, route) in &self.routes {
            if route.method() != method {
                continue;
            }
            if let Some(params) = route.pattern().matches(local) {
                debug!(
                    method = %method,
                    path = %path,
                    route_pattern = %route.pattern().as_str(),
                    route_name = %name,
                    path_params = ?params,
                    "Route matched"
                );
                return Some(RouteMatch {
                    name: name.clone(),
                    route: Arc::clone(route),
                    path_params: params,
                });
            }
        }

        warn!(method = %method, path = %path, "No route matched");
        None
    }

    /// Log all registered routes.
    ///
    /// Useful for verifying at startup that routes are loaded correctly.
    pub fn dump_routes(&self) {
        info!(
            namespace = %self.namespace,
            routes_count = self.routes.len(),
            "Registered routes"
        );
        for (name, route) in &self.routes {
            info!(
                "[route] {} /{}{} -> {}",
                route.method(),
                self.namespace,
                route.pattern().as_str(),
                name
            );
        }
    }
}

//! Cross-cutting request/response concerns.
//!
//! This layer deliberately has no general middleware chain: authentication
//! is a single dedicated step in the dispatcher, and the only other
//! cross-cutting concern is the CORS policy applied to every response.

mod cors;

pub use cors::CorsPolicy;

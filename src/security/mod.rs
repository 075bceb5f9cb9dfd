//! # Security Module
//!
//! Bearer-token authentication against the identity provider's published
//! signing keys.
//!
//! ## Flow
//!
//! 1. The dispatcher calls [`Authenticator::authenticate`] for every route
//!    that has not explicitly opted out.
//! 2. The token is extracted from the `Authorization` header (`Bearer `
//!    scheme required).
//! 3. Its signature is verified against keys from the process-wide
//!    [`JwksKeyStore`] cache, checking the expected issuer.
//! 4. On success the handler receives an [`AuthContext`]: the resolved
//!    [`Principal`] plus a [`DataAccess`] handle scoped to the caller's
//!    credentials.
//!
//! Public routes never see an `AuthContext` at all: their actions take no
//! such parameter, so handler code cannot accidentally assume an
//! authenticated context it doesn't have.

use serde_json::Value;

mod bearer;
mod jwks;

pub use bearer::Authenticator;
pub use jwks::JwksKeyStore;

/// The authenticated identity resolved from a verified bearer token.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The token's `sub` claim.
    pub subject: String,
    /// All verified claims, for authorization decisions in handlers.
    pub claims: Value,
}

/// A credential-scoped handle to the external data store.
///
/// The store itself is an external collaborator; this layer only resolves
/// the handle and passes it through to handlers.
#[derive(Clone)]
pub struct DataAccess {
    base_url: String,
    token: String,
}

impl DataAccess {
    /// A handle acting with the given credential.
    #[must_use]
    pub fn scoped(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `Authorization` header value for requests made with this handle.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccess")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Everything a handler on an authenticated route receives about the
/// caller. Resolved once per request; absent entirely on public routes.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub data: DataAccess,
}

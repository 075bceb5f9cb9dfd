use super::{AuthContext, DataAccess, JwksKeyStore, Principal};
use crate::config::{AuthConfig, ServiceConfig};
use crate::error::Error;
use jsonwebtoken::Validation;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Verifies bearer tokens against the identity provider's published signing
/// keys and resolves the requesting principal.
///
/// Holds a shared handle to the process-wide [`JwksKeyStore`]; the store is
/// created once at startup and the authenticator only ever reads it (the
/// store refreshes itself).
pub struct Authenticator {
    auth: AuthConfig,
    service: ServiceConfig,
    keys: Arc<JwksKeyStore>,
}

impl Authenticator {
    #[must_use]
    pub fn new(auth: AuthConfig, service: ServiceConfig, keys: Arc<JwksKeyStore>) -> Self {
        Self {
            auth,
            service,
            keys,
        }
    }

    /// Build an authenticator and its key store from the process
    /// environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let auth = AuthConfig::from_env()?;
        let service = ServiceConfig::from_env()?;
        let keys = Arc::new(JwksKeyStore::new(auth.jwks_url.clone()));
        Ok(Self::new(auth, service, keys))
    }

    /// Authenticate a request from its headers.
    ///
    /// Steps: read the `Authorization` header (requiring the literal
    /// `Bearer ` scheme prefix); verify the token's signature against the
    /// cached signing keys, checking the expected issuer (and audience,
    /// when configured); resolve the principal and a data-access handle
    /// scoped to the caller's own credentials.
    pub async fn authenticate(
        &self,
        headers: &HashMap<String, String>,
    ) -> Result<AuthContext, Error> {
        let token = extract_bearer(headers)?;

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| Error::auth(format!("invalid token header: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| Error::auth("token header has no key id"))?;

        let key = self.keys.key_for(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.auth.issuer.as_str()]);
        validation.leeway = self.auth.leeway_secs;
        match &self.auth.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }

        let decoded = jsonwebtoken::decode::<Value>(token, &key, &validation)
            .map_err(|e| Error::auth(format!("token verification failed: {e}")))?;

        let claims = decoded.claims;
        let subject = claims
            .get("sub")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::auth("token has no subject claim"))?
            .to_string();

        info!(subject = %subject, kid = %kid, "Request authenticated");
        debug!(claims = %claims, "Verified token claims");

        let data = DataAccess::scoped(self.service.api_url.clone(), token);
        Ok(AuthContext {
            principal: Principal { subject, claims },
            data,
        })
    }

    /// A privileged data-access handle built from the service credential,
    /// for handlers that must act beyond the caller's own rights.
    #[must_use]
    pub fn privileged_data_access(&self) -> DataAccess {
        DataAccess::scoped(
            self.service.api_url.clone(),
            self.service.service_key.clone(),
        )
    }
}

/// Pull the token out of the `Authorization` header, requiring the literal
/// `Bearer ` scheme prefix.
fn extract_bearer(headers: &HashMap<String, String>) -> Result<&str, Error> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| Error::auth("missing Authorization header"))?;
    header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::auth("malformed Authorization header: expected Bearer scheme"))
}

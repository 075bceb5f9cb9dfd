//! Environment-based configuration.
//!
//! The identity provider's issuer and JWKS endpoint, and the credentials
//! needed to reach the external data store, are supplied via the process
//! environment and consumed here at startup.
//!
//! ## Environment Variables
//!
//! | variable                | required | meaning                                  |
//! |-------------------------|----------|------------------------------------------|
//! | `FNR_AUTH_ISSUER`       | yes      | expected `iss` claim of bearer tokens    |
//! | `FNR_JWKS_URL`          | yes      | identity provider's JWKS endpoint        |
//! | `FNR_AUTH_AUDIENCE`     | no       | expected `aud` claim (skipped if unset)  |
//! | `FNR_JWT_LEEWAY_SECS`   | no       | clock-skew leeway, default 30            |
//! | `FNR_API_URL`           | yes      | data-plane base URL                      |
//! | `FNR_SERVICE_KEY`       | yes      | privileged data-plane credential         |

use anyhow::{bail, Context, Result};
use std::env;

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing required environment variable {name}"))
}

/// Identity-provider configuration for bearer-token verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Expected `iss` claim.
    pub issuer: String,
    /// JWKS endpoint publishing the provider's signing keys.
    pub jwks_url: String,
    /// Expected `aud` claim; audience checking is skipped when unset.
    pub audience: Option<String>,
    /// Leeway for time-based claims, in seconds.
    pub leeway_secs: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(issuer: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            jwks_url: jwks_url.into(),
            audience: None,
            leeway_secs: 30,
        }
    }

    /// Configure the expected JWT audience claim.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.audience = Some(aud.into());
        self
    }

    /// Configure leeway for time-based claims validation.
    #[must_use]
    pub fn leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let issuer = required("FNR_AUTH_ISSUER")?;
        let jwks_url = required("FNR_JWKS_URL")?;
        if url::Url::parse(&jwks_url).is_err() {
            bail!("FNR_JWKS_URL is not a valid URL: {jwks_url}");
        }
        let leeway_secs = match env::var("FNR_JWT_LEEWAY_SECS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("FNR_JWT_LEEWAY_SECS is not a number: {v}"))?,
            Err(_) => 30,
        };
        Ok(Self {
            issuer,
            jwks_url,
            audience: env::var("FNR_AUTH_AUDIENCE").ok(),
            leeway_secs,
        })
    }
}

/// Credentials for the external data store (an external collaborator; this
/// layer only carries the handle through to handlers).
#[derive(Clone)]
pub struct ServiceConfig {
    /// Data-plane base URL.
    pub api_url: String,
    /// Privileged credential for service-role access.
    pub service_key: String,
}

impl ServiceConfig {
    #[must_use]
    pub fn new(api_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            service_key: service_key.into(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: required("FNR_API_URL")?,
            service_key: required("FNR_SERVICE_KEY")?,
        })
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_url", &self.api_url)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_builder() {
        let config = AuthConfig::new("https://id.example.com", "https://id.example.com/jwks")
            .audience("my-api")
            .leeway(5);
        assert_eq!(config.audience.as_deref(), Some("my-api"));
        assert_eq!(config.leeway_secs, 5);
    }

    #[test]
    fn test_service_config_debug_redacts_key() {
        let config = ServiceConfig::new("https://db.example.com", "super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
    }
}

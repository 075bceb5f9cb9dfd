use crate::error::Error;
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Process-wide cache of the identity provider's published signing keys,
/// keyed by key id (`kid`).
///
/// Created once at startup and passed to the [`Authenticator`] as a shared
/// `Arc` handle. Populated lazily on first use and refreshed after
/// `cache_ttl`. Concurrent requests may race to populate it; because it is
/// a pure cache keyed by key id, concurrent population is safe and
/// idempotent.
///
/// [`Authenticator`]: super::Authenticator
pub struct JwksKeyStore {
    jwks_url: String,
    cache_ttl: Duration,
    // kid -> DecodingKey, with the instant of the last successful refresh
    cache: Mutex<(Option<Instant>, HashMap<String, DecodingKey>)>,
    http: reqwest::Client,
}

impl JwksKeyStore {
    /// Create a key store for a JWKS endpoint.
    ///
    /// # Panics
    ///
    /// Panics at startup if the URL is invalid or uses plain HTTP for a
    /// host other than `localhost`/`127.0.0.1`, since fetching signing keys over
    /// an insecure transport would defeat verification entirely.
    #[must_use]
    pub fn new(jwks_url: impl Into<String>) -> Self {
        let url_str = jwks_url.into();

        let parsed = match Url::parse(&url_str) {
            Ok(u) => u,
            Err(e) => panic!("JWKS URL is invalid: {url_str}. Error: {e}"),
        };
        match parsed.scheme() {
            "https" => {}
            "http" => {
                // Exact-host comparison: "localhost.attacker.com" must not pass.
                let host = parsed
                    .host_str()
                    .unwrap_or_else(|| panic!("JWKS URL must have a valid hostname. Got: {url_str}"));
                if host != "localhost" && host != "127.0.0.1" {
                    panic!(
                        "JWKS URL must use HTTPS (HTTP only allowed for localhost/127.0.0.1). Got: {url_str}"
                    );
                }
            }
            other => panic!("JWKS URL must use HTTPS or HTTP, got scheme {other:?}: {url_str}"),
        }

        Self {
            jwks_url: url_str,
            cache_ttl: Duration::from_secs(300),
            cache: Mutex::new((None, HashMap::new())),
            http: reqwest::Client::new(),
        }
    }

    /// Configure the TTL for cached keys. Keys are cached to avoid a JWKS
    /// fetch per request.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Look up the decoding key for a key id, refreshing the cache from the
    /// JWKS endpoint when it is empty or stale.
    pub async fn key_for(&self, kid: &str) -> Result<DecodingKey, Error> {
        let needs_refresh = {
            let guard = self
                .cache
                .lock()
                .map_err(|_| Error::internal("JWKS cache lock poisoned"))?;
            let (last, keys) = &*guard;
            match last {
                Some(at) => at.elapsed() >= self.cache_ttl || !keys.contains_key(kid),
                None => true,
            }
        };

        if needs_refresh {
            self.refresh().await?;
        }

        let guard = self
            .cache
            .lock()
            .map_err(|_| Error::internal("JWKS cache lock poisoned"))?;
        guard
            .1
            .get(kid)
            .cloned()
            .ok_or_else(|| Error::auth(format!("unknown signing key id {kid:?}")))
    }

    /// Fetch the JWKS document and replace the cached key map.
    async fn refresh(&self) -> Result<(), Error> {
        debug!(jwks_url = %self.jwks_url, "Fetching signing keys");

        let document: serde_json::Value = self
            .http
            .get(&self.jwks_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| Error::auth(format!("failed to fetch signing keys: {e}")))?
            .json()
            .await
            .map_err(|e| Error::auth(format!("signing key endpoint returned invalid JSON: {e}")))?;

        let keys = parse_jwks(&document);
        if keys.is_empty() {
            warn!(jwks_url = %self.jwks_url, "JWKS document contained no usable keys");
        }

        let mut guard = self
            .cache
            .lock()
            .map_err(|_| Error::internal("JWKS cache lock poisoned"))?;
        *guard = (Some(Instant::now()), keys);
        Ok(())
    }
}

/// Extract decoding keys from a JWKS document.
///
/// Supports RSA public keys (`RS256/384/512`) and `oct` symmetric secrets
/// (`HS256/384/512`); entries of any other kind are skipped with a warning.
fn parse_jwks(document: &serde_json::Value) -> HashMap<String, DecodingKey> {
    use base64::Engine as _;

    let mut map = HashMap::new();
    let Some(keys) = document.get("keys").and_then(|v| v.as_array()) else {
        return map;
    };

    for key in keys {
        let kid = key.get("kid").and_then(|v| v.as_str()).unwrap_or("");
        let kty = key.get("kty").and_then(|v| v.as_str()).unwrap_or("");
        let alg = key.get("alg").and_then(|v| v.as_str()).unwrap_or("");

        if kty.eq_ignore_ascii_case("oct")
            && (alg.eq_ignore_ascii_case("HS256")
                || alg.eq_ignore_ascii_case("HS384")
                || alg.eq_ignore_ascii_case("HS512"))
        {
            if let Some(material) = key.get("k").and_then(|v| v.as_str()) {
                match base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(material) {
                    Ok(secret) => {
                        map.insert(kid.to_string(), DecodingKey::from_secret(&secret));
                    }
                    Err(e) => warn!(kid = %kid, error = %e, "Skipping oct key with invalid material"),
                }
            }
            continue;
        }

        if kty.eq_ignore_ascii_case("RSA")
            && (alg.eq_ignore_ascii_case("RS256")
                || alg.eq_ignore_ascii_case("RS384")
                || alg.eq_ignore_ascii_case("RS512"))
        {
            let (Some(n), Some(e)) = (
                key.get("n").and_then(|v| v.as_str()),
                key.get("e").and_then(|v| v.as_str()),
            ) else {
                warn!(kid = %kid, "Skipping RSA key without modulus/exponent");
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(dk) => {
                    map.insert(kid.to_string(), dk);
                }
                Err(e) => warn!(kid = %kid, error = %e, "Skipping RSA key with invalid components"),
            }
            continue;
        }

        warn!(kid = %kid, kty = %kty, alg = %alg, "Skipping unsupported JWKS entry");
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_jwks_oct_key() {
        use base64::Engine as _;
        let k = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"secret");
        let doc = json!({ "keys": [{ "kty": "oct", "alg": "HS256", "kid": "k1", "k": k }] });
        let keys = parse_jwks(&doc);
        assert!(keys.contains_key("k1"));
    }

    #[test]
    fn test_parse_jwks_skips_unsupported() {
        let doc = json!({ "keys": [{ "kty": "EC", "alg": "ES256", "kid": "k2" }] });
        assert!(parse_jwks(&doc).is_empty());
    }

    #[test]
    #[should_panic(expected = "must use HTTPS")]
    fn test_plain_http_rejected_for_remote_hosts() {
        let _ = JwksKeyStore::new("http://localhost.attacker.com/jwks.json");
    }
}

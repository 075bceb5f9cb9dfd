use fnroute::{AuthConfig, Authenticator, JwksKeyStore, ServiceConfig};
use std::sync::Arc;

/// Install a tracing subscriber once so test failures come with logs.
pub fn init_tracing() {
    fnroute::init_tracing();
}

/// An authenticator wired to an address nothing listens on.
///
/// Good enough for every test that never presents a token (missing-header
/// failures happen before any key fetch) or that only exercises public
/// routes.
#[allow(dead_code)]
pub fn offline_authenticator() -> Authenticator {
    let auth = AuthConfig::new("http://127.0.0.1:9/auth", "http://127.0.0.1:9/jwks.json");
    let service = ServiceConfig::new("http://127.0.0.1:9", "test-service-key");
    let keys = Arc::new(JwksKeyStore::new(auth.jwks_url.clone()));
    Authenticator::new(auth, service, keys)
}

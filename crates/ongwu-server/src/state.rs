//! Application state.

use std::sync::Arc;

use ongwu_db::OngwuStore;

use crate::auth::{AuthGate, JwtVerifier, TokenIssuer, TokenVerifier};
use crate::cache::{CacheSettings, ResponseCache};

/// Application state shared across all handlers.
///
/// Construido una vez en el arranque e inyectado via `State`; el cache y
/// el gate no son globales.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn OngwuStore>,
    cache: ResponseCache,
    gate: Arc<AuthGate>,
    issuer: Arc<TokenIssuer>,
}

impl AppState {
    /// Crea el estado con el verificador JWT de produccion.
    pub fn new(store: Arc<dyn OngwuStore>, jwt_secret: &str) -> Self {
        let cache = ResponseCache::new(CacheSettings::default());
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(jwt_secret));
        let issuer = Arc::new(TokenIssuer::new(jwt_secret));
        Self::with_parts(store, cache, verifier, issuer)
    }

    /// Construccion con colaboradores explicitos (tests y tuning).
    pub fn with_parts(
        store: Arc<dyn OngwuStore>,
        cache: ResponseCache,
        verifier: Arc<dyn TokenVerifier>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        let gate = Arc::new(AuthGate::new(verifier, cache.clone()));
        Self {
            store,
            cache,
            gate,
            issuer,
        }
    }

    pub fn store(&self) -> &dyn OngwuStore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

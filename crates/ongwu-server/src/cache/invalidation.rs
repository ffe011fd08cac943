//! Bulk cache invalidation.
//!
//! Los endpoints de mutacion invalidan por usuario o por recurso; la
//! coincidencia es sobre los campos de [`CacheKey`], nunca sobre
//! substrings de un string formateado.

use tracing::info;

use crate::cache::keys::{CacheKey, ResourceKind};
use crate::cache::response_cache::ResponseCache;

/// Resultado de una operacion de invalidacion.
#[derive(Debug, Clone)]
pub struct InvalidationResult {
    /// Numero de entries invalidadas.
    pub count: usize,
    /// Keys invalidadas (renderizadas).
    pub keys: Vec<String>,
}

impl ResponseCache {
    /// Invalida todas las entries de recursos de un usuario, de todos
    /// los kinds. Las entries `Verify` de tokens no se tocan.
    pub async fn invalidate_user(&self, user_id: i64) -> InvalidationResult {
        let result = self
            .invalidate_matching(|key| key.user_id() == Some(user_id))
            .await;

        info!(
            user_id = user_id,
            count = result.count,
            "Cache entries invalidated for user"
        );
        result
    }

    /// Invalida las entries de un recurso concreto de un usuario.
    pub async fn invalidate_resource(
        &self,
        kind: ResourceKind,
        user_id: i64,
    ) -> InvalidationResult {
        let result = self
            .invalidate_matching(|key| {
                matches!(
                    key,
                    CacheKey::Resource { kind: k, user_id: u } if *k == kind && *u == user_id
                )
            })
            .await;

        info!(
            resource = kind.as_str(),
            user_id = user_id,
            count = result.count,
            "Cache entries invalidated"
        );
        result
    }

    /// Invalida la verificacion cacheada de un token (logout).
    pub async fn invalidate_token(&self, token: &str) {
        self.invalidate(&CacheKey::verify(token)).await;
    }

    async fn invalidate_matching(&self, pred: impl Fn(&CacheKey) -> bool) -> InvalidationResult {
        // Recolectar primero: iter() es un snapshot y la invalidacion
        // muta el mapa.
        let mut matched = Vec::new();
        for (key, _) in self.iter() {
            if pred(&key) {
                matched.push((*key).clone());
            }
        }

        let keys: Vec<String> = matched.iter().map(ToString::to_string).collect();
        for key in &matched {
            self.invalidate(key).await;
        }

        InvalidationResult {
            count: keys.len(),
            keys,
        }
    }
}

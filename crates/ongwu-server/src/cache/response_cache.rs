//! Response cache using Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;

use crate::cache::keys::CacheKey;
use crate::metrics::CacheMetrics;

/// Configuracion del cache.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// TTL por defecto para entries insertadas sin TTL explicito
    /// (default: 30 segundos, los datos pueden mutar entre requests).
    pub default_ttl: Duration,
    /// Maximo numero de entries (default: 10000).
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            max_capacity: 10_000,
        }
    }
}

/// Una entry cacheada: payload JSON arbitrario mas su TTL.
///
/// El payload puede ser cualquier valor serializable, incluidos valores
/// "falsy" como `false` o listas vacias; un hit con esos payloads es
/// distinguible de un miss porque `get` retorna `Option`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    payload: Value,
    ttl: Duration,
}

impl CacheEntry {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Politica de expiracion: cada entry vive exactamente su TTL contado
/// desde el insert que la escribio. Un insert sobre una key existente
/// reemplaza la entry completa y reinicia el reloj.
struct PerEntryTtl;

impl Expiry<CacheKey, Arc<CacheEntry>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Snapshot de introspeccion del cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: u64,
    pub keys: Vec<String>,
}

/// Response cache del servidor. Thread-safe y async-friendly.
///
/// Las entries expiradas se descartan al ser observadas (expiracion
/// lazy de Moka), no hace falta un sweep de fondo.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
    metrics: CacheMetrics,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Crea un nuevo cache con la configuracion dada.
    pub fn new(settings: CacheSettings) -> Self {
        let metrics = CacheMetrics::new();

        // Listener para evictions
        let eviction_metrics = metrics.clone();
        let inner = Cache::builder()
            .max_capacity(settings.max_capacity)
            .expire_after(PerEntryTtl)
            .eviction_listener(move |_key, _value, cause| {
                let reason = match cause {
                    moka::notification::RemovalCause::Expired => "ttl",
                    moka::notification::RemovalCause::Size => "capacity",
                    moka::notification::RemovalCause::Explicit => "manual",
                    moka::notification::RemovalCause::Replaced => "replaced",
                };
                eviction_metrics.record_eviction(reason);
            })
            .build();

        Self {
            inner,
            metrics,
            default_ttl: settings.default_ttl,
        }
    }

    /// Obtiene la entry viva para la key, o `None` si nunca se inserto,
    /// fue invalidada, o expiro.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let start = Instant::now();
        let result = self.inner.get(key).await;

        if result.is_some() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }

        self.metrics.record_operation_duration("get", start.elapsed());
        self.update_entry_gauge();

        result
    }

    /// Inserta un payload con el TTL por defecto, sobreescribiendo
    /// incondicionalmente cualquier entry previa.
    pub async fn insert(&self, key: CacheKey, payload: Value) {
        self.insert_with_ttl(key, payload, self.default_ttl).await;
    }

    /// Inserta un payload con TTL propio.
    pub async fn insert_with_ttl(&self, key: CacheKey, payload: Value, ttl: Duration) {
        let start = Instant::now();
        self.inner
            .insert(key, Arc::new(CacheEntry { payload, ttl }))
            .await;
        self.metrics
            .record_operation_duration("insert", start.elapsed());
        self.update_entry_gauge();
    }

    /// Invalida una entry especifica.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
    }

    /// Invalida todas las entries. Solo para resets completos; el camino
    /// normal de requests usa las invalidaciones por usuario.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Numero aproximado de entries en cache.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Itera sobre las entries. Es un snapshot, puede cambiar durante la
    /// iteracion.
    pub fn iter(&self) -> impl Iterator<Item = (Arc<CacheKey>, Arc<CacheEntry>)> + '_ {
        self.inner.iter()
    }

    /// Snapshot de introspeccion: tamano y keys presentes.
    pub fn stats(&self) -> CacheStats {
        let keys: Vec<String> = self.iter().map(|(key, _)| key.to_string()).collect();
        CacheStats {
            size: keys.len() as u64,
            keys,
        }
    }

    /// TTL por defecto configurado.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn update_entry_gauge(&self) {
        self.metrics.update_entry_count(self.inner.entry_count());
    }

    /// Fuerza la limpieza de entries pendientes (para tests).
    #[cfg(test)]
    pub(crate) fn sync(&self) {
        self.inner.run_pending_tasks();
    }
}

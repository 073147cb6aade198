use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    collections::{HashSet, VecDeque},
    sync::{atomic::Ordering, Arc},
    time::Duration,
};
use tracing::{debug, error, info, warn};

use super::{CacheEntry, CacheMetrics, CacheStats, EvictionPolicy};
use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    storage::CacheStore,
};

/// TTL por defecto (1 hora)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Caché clave-valor con TTL sobre un store con nombre.
///
/// Ninguna operación devuelve error: los fallos del backend se registran
/// y se tratan como ausencia de valor.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    cache_name: String,
    max_items: usize,
    default_ttl: Duration,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
    /// Claves escritas por este manager, de la más antigua a la más reciente
    write_order: Mutex<VecDeque<String>>,
    stats: CacheStats,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, cache_name: impl Into<String>, max_items: usize) -> Self {
        Self {
            store,
            cache_name: cache_name.into(),
            max_items,
            default_ttl: DEFAULT_TTL,
            policy: EvictionPolicy::default(),
            clock: Arc::new(SystemClock),
            write_order: Mutex::new(VecDeque::new()),
            stats: CacheStats::default(),
        }
    }

    pub fn from_config(store: Arc<dyn CacheStore>, config: &Config) -> Self {
        Self::new(store, config.cache_name.clone(), config.max_cache_size)
            .with_ttl(config.default_ttl())
            .with_policy(config.cache_eviction)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.stats.snapshot()
    }

    /// Devuelve el payload si existe y no ha expirado
    pub async fn get(&self, key: &str) -> Option<Value> {
        let path = Self::entry_key(key);

        let body = match self.store.get(&self.cache_name, &path).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                self.record_miss(key);
                return None;
            }
            Err(e) => {
                error!("Cache get error: {}", e);
                self.record_miss(key);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&body) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Entrada de cache corrupta '{}': {}", key, e);
                self.record_miss(key);
                return None;
            }
        };

        if entry.is_expired(self.clock.now_millis()) {
            self.delete(key).await;
            self.stats.expired_removals.fetch_add(1, Ordering::Relaxed);
            self.record_miss(key);
            debug!("⏰ Entrada expirada removida: {}", key);
            return None;
        }

        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        debug!("✅ Cache hit: {}", key);
        Some(entry.data)
    }

    /// Igual que [`get`](Self::get) pero deserializa el payload a `T`
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!("Payload de cache con forma inesperada '{}': {}", key, e);
                None
            }
        }
    }

    /// Guarda un payload con el TTL por defecto
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T) {
        self.set_with_ttl(key, data, self.default_ttl).await;
    }

    /// Guarda un payload con expiración `now + ttl` y aplica el límite de tamaño
    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, data: &T, ttl: Duration) {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                error!("Cache set error: {}", e);
                return;
            }
        };

        let entry = CacheEntry::new(data, self.clock.now_millis(), ttl);
        let body = match serde_json::to_string(&entry) {
            Ok(body) => body,
            Err(e) => {
                error!("Cache set error: {}", e);
                return;
            }
        };

        let path = Self::entry_key(key);
        if let Err(e) = self.store.put(&self.cache_name, &path, body).await {
            error!("Cache set error: {}", e);
            return;
        }

        self.record_write(&path);
        debug!("💾 Cache set: {} (ttl {}s)", key, ttl.as_secs());

        self.enforce_max_items().await;
    }

    /// Elimina la entrada; idempotente
    pub async fn delete(&self, key: &str) -> bool {
        let path = Self::entry_key(key);
        self.forget(&path);

        match self.store.delete(&self.cache_name, &path).await {
            Ok(removed) => removed,
            Err(e) => {
                error!("Cache delete error: {}", e);
                false
            }
        }
    }

    /// Elimina el store completo
    pub async fn clear(&self) -> bool {
        self.write_order.lock().clear();

        match self.store.delete_store(&self.cache_name).await {
            Ok(removed) => {
                info!("🗑️ Cache '{}' limpiado", self.cache_name);
                removed
            }
            Err(e) => {
                error!("Cache clear error: {}", e);
                false
            }
        }
    }

    /// Número de entradas físicas del store (incluye expiradas aún no leídas)
    pub async fn len(&self) -> usize {
        match self.store.keys(&self.cache_name).await {
            Ok(keys) => keys.len(),
            Err(e) => {
                error!("Cache keys error: {}", e);
                0
            }
        }
    }

    /// Limpia entradas expiradas y retorna el número de elementos removidos
    pub async fn cleanup_expired(&self) -> usize {
        let keys = match self.store.keys(&self.cache_name).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Cache keys error: {}", e);
                return 0;
            }
        };

        let now = self.clock.now_millis();
        let mut removed = 0;

        for path in keys {
            let expired = match self.store.get(&self.cache_name, &path).await {
                Ok(Some(body)) => serde_json::from_str::<CacheEntry>(&body)
                    .map(|entry| entry.is_expired(now))
                    .unwrap_or(false),
                _ => false,
            };

            if expired && matches!(self.store.delete(&self.cache_name, &path).await, Ok(true)) {
                self.forget(&path);
                removed += 1;
            }
        }

        if removed > 0 {
            self.stats
                .expired_removals
                .fetch_add(removed as u64, Ordering::Relaxed);
            info!("🧹 Cache cleanup: removed {} expired entries", removed);
        }

        removed
    }

    // Funciones privadas

    fn entry_key(key: &str) -> String {
        format!("/cache/{}", key)
    }

    fn record_miss(&self, key: &str) {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!("❌ Cache miss: {}", key);
    }

    fn record_write(&self, path: &str) {
        let mut order = self.write_order.lock();
        order.retain(|k| k != path);
        order.push_back(path.to_string());
    }

    fn forget(&self, path: &str) {
        self.write_order.lock().retain(|k| k != path);
    }

    async fn enforce_max_items(&self) {
        let mut keys = match self.store.keys(&self.cache_name).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Cache set error: {}", e);
                return;
            }
        };

        while keys.len() > self.max_items {
            let Some(victim) = self.pick_victim(&keys) else {
                break;
            };

            if let Err(e) = self.store.delete(&self.cache_name, &victim).await {
                error!("Cache eviction error: {}", e);
                return;
            }

            self.forget(&victim);
            keys.retain(|k| k != &victim);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("♻️ Entrada expulsada ({}): {}", self.policy, victim);
        }
    }

    fn pick_victim(&self, keys: &[String]) -> Option<String> {
        match self.policy {
            EvictionPolicy::Enumeration => keys.first().cloned(),
            EvictionPolicy::Fifo => {
                let mut order = self.write_order.lock();

                // Entradas de sesiones anteriores: sin fecha conocida, van primero
                let known: HashSet<&String> = order.iter().collect();
                if let Some(unknown) = keys.iter().find(|k| !known.contains(k)) {
                    return Some(unknown.clone());
                }

                let present: HashSet<&String> = keys.iter().collect();
                while let Some(oldest) = order.front() {
                    if present.contains(oldest) {
                        return Some(oldest.clone());
                    }
                    order.pop_front();
                }

                keys.first().cloned()
            }
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("cache_name", &self.cache_name)
            .field("max_items", &self.max_items)
            .field("default_ttl", &self.default_ttl)
            .field("policy", &self.policy)
            .finish()
    }
}

//! # Cache Module
//!
//! TTL-bounded key-value cache used by the player to persist its state
//! across sessions.
//!
//! [`CacheManager`] wraps one named store of a [`CacheStore`] backend and
//! exposes `get`/`set`/`delete`/`clear`. Every payload is wrapped as
//! `{data, expires}` and kept under a request-style key (`/cache/{key}`).
//!
//! ## Features
//!
//! - **Lazy Expiry**: expired entries are deleted when they are read
//! - **Bounded Size**: the store never keeps more than `max_items` entries
//! - **Eviction Policies**: strict FIFO or store enumeration order
//! - **Fail Soft**: storage failures are logged and read as a miss
//! - **Metrics**: hit/miss/eviction counters
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use streamtube::cache::CacheManager;
//! use streamtube::storage::MemoryStore;
//!
//! # async fn example() {
//! let cache = CacheManager::new(Arc::new(MemoryStore::new()), "streamtube-cache", 100);
//!
//! cache.set("greeting", &"hello").await;
//! if let Some(value) = cache.get("greeting").await {
//!     println!("cached: {}", value);
//! }
//! # }
//! ```
//!
//! [`CacheStore`]: crate::storage::CacheStore

pub mod entry;
pub mod manager;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub use entry::CacheEntry;
pub use manager::CacheManager;

/// Política de expulsión cuando el store supera `max_items`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Expulsa la clave escrita hace más tiempo (índice ordenado explícito)
    #[default]
    Fifo,
    /// Expulsa la primera clave que enumera el store
    Enumeration,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::Enumeration => "enumeration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fifo" => Some(EvictionPolicy::Fifo),
            "enumeration" | "enum" => Some(EvictionPolicy::Enumeration),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contadores internos del cache
#[derive(Debug, Default)]
pub(crate) struct CacheStats {
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) evictions: AtomicU64,
    pub(crate) expired_removals: AtomicU64,
}

impl CacheStats {
    pub(crate) fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired_removals: self.expired_removals.load(Ordering::Relaxed),
        }
    }
}

/// Métricas básicas del cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired_removals: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_eviction_policies() {
        assert_eq!(EvictionPolicy::parse("FIFO"), Some(EvictionPolicy::Fifo));
        assert_eq!(EvictionPolicy::parse("enumeration"), Some(EvictionPolicy::Enumeration));
        assert_eq!(EvictionPolicy::parse("lru"), None);
    }

    #[test]
    fn hit_rate_handles_empty_metrics() {
        let metrics = CacheMetrics {
            hits: 0,
            misses: 0,
            evictions: 0,
            expired_removals: 0,
        };
        assert_eq!(metrics.hit_rate(), 0.0);

        let metrics = CacheMetrics { hits: 3, misses: 1, ..metrics };
        assert_eq!(metrics.hit_rate(), 0.75);
    }
}

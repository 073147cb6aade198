use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheStore;
use crate::error::StorageError;

/// Backend en memoria; las claves se enumeran en orden de inserción
#[derive(Debug, Default)]
pub struct MemoryStore {
    stores: DashMap<String, Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de entradas de un store (0 si no existe)
    pub fn len(&self, store: &str) -> usize {
        self.stores.get(store).map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.stores.get(store).and_then(|entries| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, body)| body.clone())
        }))
    }

    async fn put(&self, store: &str, key: &str, body: String) -> Result<(), StorageError> {
        let mut entries = self.stores.entry(store.to_string()).or_default();

        // Reemplazo en sitio: la posición original se conserva
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = body,
            None => entries.push((key.to_string(), body)),
        }

        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> Result<bool, StorageError> {
        let Some(mut entries) = self.stores.get_mut(store) else {
            return Ok(false);
        };

        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        Ok(entries.len() != before)
    }

    async fn keys(&self, store: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .stores
            .get(store)
            .map(|entries| entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete_store(&self, store: &str) -> Result<bool, StorageError> {
        Ok(self.stores.remove(store).is_some())
    }

    async fn store_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self.stores.iter().map(|s| s.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}

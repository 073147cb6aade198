use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use super::CacheStore;
use crate::error::StorageError;

/// Backend en disco: un directorio por store, un archivo JSON por entrada
///
/// El archivo se nombra con el SHA-256 de la clave, así que cualquier URL
/// cabe en el límite de nombre del sistema de archivos; la clave original
/// viaja dentro del archivo. `keys()` devuelve el orden del directorio, que
/// no coincide con el orden de escritura.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

/// Contenido de cada archivo de entrada
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    body: String,
}

impl JsonFileStore {
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        // Crear directorio raíz si no existe
        fs::create_dir_all(&root).await?;
        info!("📁 Cache storage inicializado en: {}", root.display());

        Ok(Self { root })
    }

    fn store_dir(&self, store: &str) -> PathBuf {
        self.root.join(urlencoding::encode(store).as_ref())
    }

    fn file_name(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{}.json", hex::encode(hasher.finalize()))
    }

    fn entry_path(&self, store: &str, key: &str) -> PathBuf {
        self.store_dir(store).join(Self::file_name(key))
    }

    async fn read_entry(path: &Path) -> Result<Option<StoredEntry>, StorageError> {
        match fs::read_to_string(path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths = Vec::new();
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(paths),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }

        Ok(paths)
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(store, key);

        match Self::read_entry(&path).await? {
            Some(entry) if entry.key == key => Ok(Some(entry.body)),
            Some(entry) => Err(StorageError::Corrupt(format!(
                "{} holds '{}' instead of '{}'",
                path.display(),
                entry.key,
                key
            ))),
            None => Ok(None),
        }
    }

    async fn put(&self, store: &str, key: &str, body: String) -> Result<(), StorageError> {
        fs::create_dir_all(self.store_dir(store)).await?;

        let entry = StoredEntry {
            key: key.to_string(),
            body,
        };
        fs::write(self.entry_path(store, key), serde_json::to_string(&entry)?).await?;
        debug!("💾 Entrada guardada en '{}': {}", store, key);
        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.entry_path(store, key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self, store: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();

        for path in Self::list_dir(&self.store_dir(store)).await? {
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }

            match Self::read_entry(&path).await {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(e) => warn!("Entrada ilegible {}: {}", path.display(), e),
            }
        }

        Ok(keys)
    }

    async fn delete_store(&self, store: &str) -> Result<bool, StorageError> {
        match fs::remove_dir_all(self.store_dir(store)).await {
            Ok(()) => {
                info!("🗑️ Store eliminado: {}", store);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();

        for path in Self::list_dir(&self.root).await? {
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if let Ok(decoded) = urlencoding::decode(name) {
                    names.push(decoded.into_owned());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::CacheManager,
        error::FetchError,
        router::{MockFetcher, Request, Response, ServiceWorker},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    #[tokio::test]
    async fn stores_and_reads_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf()).await.unwrap();

        store
            .put("streamtube-cache", "/cache/player_state", "{}".into())
            .await
            .unwrap();

        assert_eq!(
            store.get("streamtube-cache", "/cache/player_state").await.unwrap().as_deref(),
            Some("{}")
        );
        assert_eq!(
            store.keys("streamtube-cache").await.unwrap(),
            vec!["/cache/player_state".to_string()]
        );
        assert!(store.get("streamtube-cache", "/cache/other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn long_keys_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf()).await.unwrap();

        let key = format!(
            "http://localhost:8080/api/search?q={}",
            "canción de cuna para dormir ".repeat(12)
        );
        assert!(key.len() > 300);

        store.put("streamtube-v1", &key, "body".into()).await.unwrap();

        assert_eq!(
            store.get("streamtube-v1", &key).await.unwrap().as_deref(),
            Some("body")
        );
        assert_eq!(store.keys("streamtube-v1").await.unwrap(), vec![key.clone()]);
        assert!(store.delete("streamtube-v1", &key).await.unwrap());
        assert!(store.keys("streamtube-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cache_manager_keeps_long_keys_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().to_path_buf()).await.unwrap());
        let cache = CacheManager::new(store, "streamtube-cache", 10);

        let key = format!("search:{}", "x".repeat(260));
        cache.set(&key, &json!({"results": []})).await;

        assert_eq!(cache.get(&key).await, Some(json!({"results": []})));
    }

    #[tokio::test]
    async fn offline_fallback_for_long_api_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().to_path_buf()).await.unwrap());
        let origin = Url::parse("http://localhost:8080").unwrap();
        let url = format!(
            "http://localhost:8080/api/search?q={}",
            urlencoding::encode(&"canción lofi para estudiar ".repeat(6))
        );

        let mut online = MockFetcher::new();
        online
            .expect_fetch()
            .returning(|_| Ok(Response::new(200, r#"{"results":[]}"#)));
        ServiceWorker::new(store.clone(), Arc::new(online), "streamtube-v1", origin.clone())
            .handle_fetch(&Request::get(&url).unwrap())
            .await
            .unwrap();

        let mut offline = MockFetcher::new();
        offline
            .expect_fetch()
            .returning(|_| Err(FetchError::Network("offline".to_string())));
        let cached = ServiceWorker::new(store, Arc::new(offline), "streamtube-v1", origin)
            .handle_fetch(&Request::get(&url).unwrap())
            .await
            .unwrap();

        assert_eq!(cached.body, r#"{"results":[]}"#);
    }

    #[tokio::test]
    async fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf()).await.unwrap();

        assert!(store.keys("nope").await.unwrap().is_empty());
        assert!(!store.delete("nope", "k").await.unwrap());
        assert!(!store.delete_store("nope").await.unwrap());
    }

    #[tokio::test]
    async fn lists_and_deletes_stores() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf()).await.unwrap();

        store.put("streamtube-v1", "http://host/", "a".into()).await.unwrap();
        store.put("streamtube-v2", "http://host/", "b".into()).await.unwrap();

        assert_eq!(
            store.store_names().await.unwrap(),
            vec!["streamtube-v1".to_string(), "streamtube-v2".to_string()]
        );

        assert!(store.delete_store("streamtube-v1").await.unwrap());
        assert_eq!(store.store_names().await.unwrap(), vec!["streamtube-v2".to_string()]);
    }
}

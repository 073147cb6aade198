//! # Storage Module
//!
//! Named persistent cache stores, the Rust counterpart of the browser's
//! Cache Storage. A backend holds any number of stores, each mapping
//! request-style keys (`/cache/player_state`, `http://host/static/app.js`)
//! to string bodies.
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`]: in-process, keys enumerate in insertion order
//! - [`JsonFileStore`]: one directory per store and one JSON file per entry;
//!   keys enumerate in directory order, which is **not** insertion order
//!
//! Both the key-value [`CacheManager`](crate::cache::CacheManager) and the
//! [`ServiceWorker`](crate::router::ServiceWorker) sit on top of this trait.

pub mod json_file;
pub mod memory;

use async_trait::async_trait;

use crate::error::StorageError;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Backend común para los stores de caché con nombre
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Obtiene el cuerpo guardado bajo `key`, si existe
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Guarda (o reemplaza) una entrada; crea el store si no existe
    async fn put(&self, store: &str, key: &str, body: String) -> Result<(), StorageError>;

    /// Elimina una entrada, devuelve si existía
    async fn delete(&self, store: &str, key: &str) -> Result<bool, StorageError>;

    /// Enumera las claves del store en el orden propio del backend
    async fn keys(&self, store: &str) -> Result<Vec<String>, StorageError>;

    /// Elimina el store completo, devuelve si existía
    async fn delete_store(&self, store: &str) -> Result<bool, StorageError>;

    /// Nombres de todos los stores existentes
    async fn store_names(&self) -> Result<Vec<String>, StorageError>;
}

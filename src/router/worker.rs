use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{Fetcher, Request, Response, RouteStrategy};
use crate::{
    config::Config,
    error::{RouterError, StorageError},
    storage::CacheStore,
};

/// Manifiesto de assets que se precargan en la instalación
pub const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/static/css/main.css",
    "/static/js/app.js",
    "/static/js/player.js",
    "/static/js/cache.js",
    "/static/icons/home.svg",
    "/static/icons/search.svg",
    "/static/icons/library.svg",
    "/static/icons/logo.png",
];

/// Router de peticiones con caché de assets versionada.
///
/// Una instancia por versión de despliegue: el nombre del store incluye la
/// versión y `activate()` borra los stores de versiones anteriores.
pub struct ServiceWorker {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    cache_name: String,
    origin: Url,
    assets: Vec<String>,
    cache_api_responses: bool,
    /// Stores ajenos al router que `activate()` no debe tocar
    preserved: Vec<String>,
}

impl ServiceWorker {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        cache_name: impl Into<String>,
        origin: Url,
    ) -> Self {
        Self {
            store,
            fetcher,
            cache_name: cache_name.into(),
            origin,
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            cache_api_responses: true,
            preserved: Vec::new(),
        }
    }

    pub fn from_config(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let origin = Url::parse(&config.api_base_url)?;

        Ok(Self::new(store, fetcher, config.asset_cache_name(), origin)
            .with_api_write_back(config.cache_api_responses)
            .preserve(config.cache_name.clone()))
    }

    pub fn with_assets(mut self, assets: Vec<String>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_api_write_back(mut self, enabled: bool) -> Self {
        self.cache_api_responses = enabled;
        self
    }

    pub fn preserve(mut self, store_name: impl Into<String>) -> Self {
        self.preserved.push(store_name.into());
        self
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Precarga el manifiesto completo; si un asset falla no se guarda ninguno
    ///
    /// Un fallo al escribir deshace solo las entradas de esta instalación: lo
    /// que dejó una instalación anterior sigue sirviendo offline.
    pub async fn install(&self) -> Result<usize, RouterError> {
        info!("📦 Instalando '{}' ({} assets)", self.cache_name, self.assets.len());

        let requests = self
            .assets
            .iter()
            .map(|asset| {
                let url = self.origin.join(asset).map_err(|e| RouterError::AssetFetch {
                    url: asset.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Request {
                    method: reqwest::Method::GET,
                    url,
                    body: None,
                })
            })
            .collect::<Result<Vec<_>, RouterError>>()?;

        let responses = try_join_all(requests.iter().map(|request| async move {
            let response = self
                .fetcher
                .fetch(request)
                .await
                .map_err(|e| RouterError::AssetFetch {
                    url: request.cache_key(),
                    reason: e.to_string(),
                })?;

            if !response.is_success() {
                return Err(RouterError::AssetStatus {
                    url: request.cache_key(),
                    status: response.status,
                });
            }

            Ok((request.cache_key(), response))
        }))
        .await
        .map_err(|e| {
            error!("❌ Instalación fallida: {}", e);
            e
        })?;

        // Contenido previo de cada clave escrita, para deshacer solo este lote
        let mut written: Vec<(String, Option<String>)> = Vec::with_capacity(responses.len());

        for (key, response) in &responses {
            let result = match self.store.get(&self.cache_name, key).await {
                Ok(previous) => self.write(key, response).await.map(|()| previous),
                Err(e) => Err(e),
            };

            match result {
                Ok(previous) => written.push((key.clone(), previous)),
                Err(e) => {
                    error!("❌ Instalación fallida al guardar {}: {}", key, e);
                    self.rollback(&written).await;
                    return Err(e.into());
                }
            }
        }

        info!("✅ '{}' instalado con {} assets", self.cache_name, responses.len());
        Ok(responses.len())
    }

    /// Devuelve cada clave del lote fallido a su estado anterior a la instalación
    async fn rollback(&self, written: &[(String, Option<String>)]) {
        let mut failed = 0;

        for (key, previous) in written.iter().rev() {
            let result = match previous {
                Some(body) => self.store.put(&self.cache_name, key, body.clone()).await,
                None => self.store.delete(&self.cache_name, key).await.map(|_| ()),
            };

            if let Err(e) = result {
                warn!("No se pudo restaurar {}: {}", key, e);
                failed += 1;
            }
        }

        if failed == 0 {
            info!("↩️ Instalación revertida ({} entradas restauradas)", written.len());
        } else {
            error!(
                "Instalación revertida con {} de {} entradas sin restaurar",
                failed,
                written.len()
            );
        }
    }

    /// Borra todos los stores de versiones anteriores; devuelve cuántos
    pub async fn activate(&self) -> usize {
        let names = match self.store.store_names().await {
            Ok(names) => names,
            Err(e) => {
                error!("Error listando stores: {}", e);
                return 0;
            }
        };

        let mut deleted = 0;
        for name in names {
            if name == self.cache_name || self.preserved.contains(&name) {
                continue;
            }

            match self.store.delete_store(&name).await {
                Ok(true) => {
                    info!("🗑️ Store obsoleto eliminado: {}", name);
                    deleted += 1;
                }
                Ok(false) => {}
                Err(e) => warn!("Error eliminando store {}: {}", name, e),
            }
        }

        deleted
    }

    /// Resuelve una petición según su estrategia; `None` si no hay respuesta posible
    pub async fn handle_fetch(&self, request: &Request) -> Option<Response> {
        let strategy = RouteStrategy::classify(&request.url);
        debug!("🧭 {} {} -> {:?}", request.method, request.url, strategy);

        match strategy {
            RouteStrategy::CacheFirst => self.cache_first(request).await,
            RouteStrategy::NetworkFirst => self.network_first(request).await,
            RouteStrategy::NetworkWithShell => self.network_with_shell(request).await,
        }
    }

    async fn cache_first(&self, request: &Request) -> Option<Response> {
        if let Some(cached) = self.match_request(request).await {
            return Some(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Asset no disponible {}: {}", request.url, e);
                None
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Option<Response> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if self.cache_api_responses && request.is_get() && response.is_success() {
                    if let Err(e) = self.write(&request.cache_key(), &response).await {
                        warn!("No se pudo cachear {}: {}", request.url, e);
                    }
                }
                Some(response)
            }
            Err(e) => {
                warn!("📴 Red no disponible para {}: {}, usando caché", request.url, e);
                self.match_request(request).await
            }
        }
    }

    async fn network_with_shell(&self, request: &Request) -> Option<Response> {
        match self.fetcher.fetch(request).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("📴 Sin red para {}: {}, sirviendo shell offline", request.url, e);
                let shell = self.origin.join("/").ok()?;
                self.match_key(shell.as_str()).await
            }
        }
    }

    async fn match_request(&self, request: &Request) -> Option<Response> {
        // Solo las peticiones GET tienen entrada en caché
        if !request.is_get() {
            return None;
        }
        self.match_key(&request.cache_key()).await
    }

    async fn match_key(&self, key: &str) -> Option<Response> {
        let body = match self.store.get(&self.cache_name, key).await {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(e) => {
                error!("Cache match error {}: {}", key, e);
                return None;
            }
        };

        match Response::from_cache_body(&body) {
            Ok(response) => {
                debug!("✅ Servido desde caché: {}", key);
                Some(response)
            }
            Err(e) => {
                warn!("Respuesta cacheada corrupta {}: {}", key, e);
                None
            }
        }
    }

    async fn write(&self, key: &str, response: &Response) -> Result<(), StorageError> {
        let body = response.to_cache_body()?;
        self.store.put(&self.cache_name, key, body).await
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("cache_name", &self.cache_name)
            .field("origin", &self.origin.as_str())
            .field("assets", &self.assets.len())
            .field("cache_api_responses", &self.cache_api_responses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::FetchError, router::MockFetcher, storage::MemoryStore};
    use pretty_assertions::assert_eq;

    const ORIGIN: &str = "http://localhost:8080";

    fn origin() -> Url {
        Url::parse(ORIGIN).unwrap()
    }

    fn url(path: &str) -> String {
        format!("{}{}", ORIGIN, path)
    }

    fn offline() -> MockFetcher {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Err(FetchError::Network("offline".to_string())));
        fetcher
    }

    fn serving_everything() -> MockFetcher {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|req| Ok(Response::new(200, format!("network:{}", req.url.path()))));
        fetcher
    }

    fn worker(store: Arc<dyn CacheStore>, fetcher: MockFetcher) -> ServiceWorker {
        ServiceWorker::new(store, Arc::new(fetcher), "streamtube-v1", origin())
    }

    #[tokio::test]
    async fn install_caches_whole_manifest() {
        let store = Arc::new(MemoryStore::new());
        let sw = worker(store.clone(), serving_everything());

        assert_eq!(sw.install().await.unwrap(), DEFAULT_ASSETS.len());
        assert_eq!(store.len("streamtube-v1"), DEFAULT_ASSETS.len());
        assert!(store.get("streamtube-v1", &url("/")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|req| {
            if req.url.path() == "/static/icons/logo.png" {
                Ok(Response::new(404, "missing"))
            } else {
                Ok(Response::new(200, "ok"))
            }
        });
        let sw = worker(store.clone(), fetcher);

        let err = sw.install().await.unwrap_err();
        assert!(matches!(err, RouterError::AssetStatus { status: 404, .. }));
        assert_eq!(store.len("streamtube-v1"), 0);
    }

    #[tokio::test]
    async fn install_fails_on_network_error() {
        let store = Arc::new(MemoryStore::new());
        let sw = worker(store.clone(), offline());

        assert!(matches!(
            sw.install().await,
            Err(RouterError::AssetFetch { .. })
        ));
        assert!(store.store_names().await.unwrap().is_empty());
    }

    /// Store en memoria cuyas escrituras fallan para las claves que terminan en `fail_suffix`
    struct FailingWrites {
        inner: MemoryStore,
        fail_suffix: parking_lot::Mutex<Option<String>>,
    }

    impl FailingWrites {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_suffix: parking_lot::Mutex::new(None),
            }
        }

        fn fail_on(&self, suffix: &str) {
            *self.fail_suffix.lock() = Some(suffix.to_string());
        }
    }

    #[async_trait::async_trait]
    impl CacheStore for FailingWrites {
        async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(store, key).await
        }

        async fn put(&self, store: &str, key: &str, body: String) -> Result<(), StorageError> {
            let failing = self
                .fail_suffix
                .lock()
                .as_deref()
                .map_or(false, |suffix| key.ends_with(suffix));
            if failing {
                return Err(StorageError::StoreUnavailable("disk full".to_string()));
            }
            self.inner.put(store, key, body).await
        }

        async fn delete(&self, store: &str, key: &str) -> Result<bool, StorageError> {
            self.inner.delete(store, key).await
        }

        async fn keys(&self, store: &str) -> Result<Vec<String>, StorageError> {
            self.inner.keys(store).await
        }

        async fn delete_store(&self, store: &str) -> Result<bool, StorageError> {
            self.inner.delete_store(store).await
        }

        async fn store_names(&self) -> Result<Vec<String>, StorageError> {
            self.inner.store_names().await
        }
    }

    fn serving_version(version: &'static str) -> MockFetcher {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(move |req| {
                Ok(Response::new(200, format!("{}:{}", version, req.url.path())))
            });
        fetcher
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_install() {
        let store = Arc::new(FailingWrites::new());

        worker(store.clone(), serving_version("v1"))
            .install()
            .await
            .unwrap();

        store.fail_on("/static/icons/logo.png");
        let reinstall = worker(store.clone(), serving_version("v2")).install().await;
        assert!(matches!(
            reinstall,
            Err(RouterError::Storage(StorageError::StoreUnavailable(_)))
        ));

        assert_eq!(store.inner.len("streamtube-v1"), DEFAULT_ASSETS.len());

        let sw = worker(store.clone(), offline());
        let shell = sw
            .handle_fetch(&Request::get(&url("/library")).unwrap())
            .await
            .unwrap();
        assert_eq!(shell.body, "v1:/");

        let script = sw
            .handle_fetch(&Request::get(&url("/static/js/app.js")).unwrap())
            .await
            .unwrap();
        assert_eq!(script.body, "v1:/static/js/app.js");
    }

    #[tokio::test]
    async fn failed_first_install_leaves_no_entries() {
        let store = Arc::new(FailingWrites::new());
        store.fail_on("/static/icons/logo.png");

        let sw = worker(store.clone(), serving_everything());
        assert!(sw.install().await.is_err());
        assert_eq!(store.inner.len("streamtube-v1"), 0);
    }

    #[tokio::test]
    async fn failed_install_leaves_other_entries_alone() {
        let store = Arc::new(FailingWrites::new());
        let api_key = url("/api/liked");
        store
            .put("streamtube-v1", &api_key, Response::new(200, "liked").to_cache_body().unwrap())
            .await
            .unwrap();
        store.fail_on("/static/icons/logo.png");

        let sw = worker(store.clone(), serving_everything());
        assert!(sw.install().await.is_err());

        assert_eq!(store.inner.keys("streamtube-v1").await.unwrap(), vec![api_key]);
    }

    #[tokio::test]
    async fn static_assets_are_cache_first() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "streamtube-v1",
                &url("/static/js/app.js"),
                Response::new(200, "cached").to_cache_body().unwrap(),
            )
            .await
            .unwrap();

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Response::new(200, "network")));
        let sw = worker(store.clone(), fetcher);

        let hit = sw
            .handle_fetch(&Request::get(&url("/static/js/app.js")).unwrap())
            .await
            .unwrap();
        assert_eq!(hit.body, "cached");

        // Fallo de caché: red, sin escritura
        let miss = sw
            .handle_fetch(&Request::get(&url("/static/css/other.css")).unwrap())
            .await
            .unwrap();
        assert_eq!(miss.body, "network");
        assert_eq!(store.len("streamtube-v1"), 1);
    }

    #[tokio::test]
    async fn static_miss_while_offline_is_absent() {
        let sw = worker(Arc::new(MemoryStore::new()), offline());
        assert!(sw
            .handle_fetch(&Request::get(&url("/static/js/app.js")).unwrap())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn api_is_network_first_with_write_back() {
        let store = Arc::new(MemoryStore::new());
        let sw = worker(store.clone(), serving_everything());

        let request = Request::get(&url("/api/liked")).unwrap();
        let response = sw.handle_fetch(&request).await.unwrap();

        assert_eq!(response.body, "network:/api/liked");
        assert!(store
            .get("streamtube-v1", &request.cache_key())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn api_offline_falls_back_to_exact_cached_request() {
        let store = Arc::new(MemoryStore::new());

        // Primero con red: queda cacheada
        let online = worker(store.clone(), serving_everything());
        online
            .handle_fetch(&Request::get(&url("/api/liked")).unwrap())
            .await
            .unwrap();

        let sw = worker(store.clone(), offline());
        let cached = sw
            .handle_fetch(&Request::get(&url("/api/liked")).unwrap())
            .await
            .unwrap();
        assert_eq!(cached.body, "network:/api/liked");

        // Otra query, nunca cacheada
        assert!(sw
            .handle_fetch(&Request::get(&url("/api/liked?page=2")).unwrap())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn api_without_write_back_never_caches() {
        let store = Arc::new(MemoryStore::new());
        let sw = worker(store.clone(), serving_everything()).with_api_write_back(false);

        sw.handle_fetch(&Request::get(&url("/api/liked")).unwrap())
            .await
            .unwrap();
        assert_eq!(store.len("streamtube-v1"), 0);
    }

    #[tokio::test]
    async fn api_errors_are_returned_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(Response::new(500, "boom")));
        let sw = worker(store.clone(), fetcher);

        let response = sw
            .handle_fetch(&Request::get(&url("/api/track/abc")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(store.len("streamtube-v1"), 0);
    }

    #[tokio::test]
    async fn post_requests_have_no_cache_fallback() {
        let store = Arc::new(MemoryStore::new());
        let sw = worker(store.clone(), offline());

        let like = Request::new(reqwest::Method::POST, &url("/api/like"))
            .unwrap()
            .with_body(r#"{"song_id":"abc"}"#);
        assert!(sw.handle_fetch(&like).await.is_none());
    }

    #[tokio::test]
    async fn navigation_falls_back_to_offline_shell() {
        let store = Arc::new(MemoryStore::new());
        let online = worker(store.clone(), serving_everything());
        online.install().await.unwrap();

        let sw = worker(store.clone(), offline());
        let shell = sw
            .handle_fetch(&Request::get(&url("/library")).unwrap())
            .await
            .unwrap();
        assert_eq!(shell.body, "network:/");
    }

    #[tokio::test]
    async fn activate_purges_old_versions_only() {
        let store = Arc::new(MemoryStore::new());
        for name in ["streamtube-v0", "streamtube-v1", "streamtube-cache"] {
            store.put(name, "k", "v".into()).await.unwrap();
        }

        let sw = worker(store.clone(), offline()).preserve("streamtube-cache");

        assert_eq!(sw.activate().await, 1);
        assert_eq!(
            store.store_names().await.unwrap(),
            vec!["streamtube-cache".to_string(), "streamtube-v1".to_string()]
        );
    }
}

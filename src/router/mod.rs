//! # Router Module
//!
//! Request router with an offline asset cache, the Rust counterpart of the
//! front end's service worker.
//!
//! Every request is classified by URL path and served with one of three
//! strategies:
//!
//! | Path contains | Strategy                                             |
//! |---------------|------------------------------------------------------|
//! | `/static/`    | cache-first, network on miss (no write-back)         |
//! | `/api/`       | network-first, cached copy of the same request offline |
//! | anything else | network, cached `/` as offline shell                 |
//!
//! The asset store name carries the deployment version
//! (`streamtube-v1`); [`ServiceWorker::install`] preloads the manifest
//! all-or-nothing and [`ServiceWorker::activate`] purges older versions.

pub mod fetcher;
pub mod request;
pub mod worker;

use url::Url;

pub use fetcher::{Fetcher, HttpFetcher};
#[cfg(test)]
pub use fetcher::MockFetcher;
pub use request::{Request, Response};
pub use worker::{ServiceWorker, DEFAULT_ASSETS};

/// Estrategia de caché aplicada a una petición
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStrategy {
    CacheFirst,
    NetworkFirst,
    NetworkWithShell,
}

impl RouteStrategy {
    /// Reglas evaluadas en orden: assets, API, navegación
    pub fn classify(url: &Url) -> Self {
        let path = url.path();

        if path.contains("/static/") {
            RouteStrategy::CacheFirst
        } else if path.contains("/api/") {
            RouteStrategy::NetworkFirst
        } else {
            RouteStrategy::NetworkWithShell
        }
    }
}

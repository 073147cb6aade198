//! # Error Types
//!
//! Typed failures for every seam of the player core. None of these reach
//! the user directly: the cache, the player and the router catch them where
//! they happen, log them and fall back to a safe default. Only the asset
//! install of the router and configuration loading surface errors.

use thiserror::Error;

/// Fallos del almacenamiento persistente de caché
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on cache store: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache store '{0}' is not available")]
    StoreUnavailable(String),

    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

/// Fallos al consumir la API HTTP de StreamTube
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("invalid response body from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("invalid api url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();

        if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                endpoint,
            }
        } else if err.is_decode() {
            ApiError::Decode {
                endpoint,
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// El runtime rechazó iniciar la reproducción
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("playback was rejected: {0}")]
    Rejected(String),

    #[error("no media source loaded")]
    NoSource,
}

/// Fallos de la red vista desde el router de peticiones
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("invalid request url '{0}'")]
    InvalidUrl(String),
}

/// Fallos de instalación del router de assets
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("failed to fetch asset {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    #[error("asset {url} answered with status {status}")]
    AssetStatus { url: String, status: u16 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

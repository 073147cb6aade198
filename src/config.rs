use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::cache::EvictionPolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // API
    pub api_base_url: String,
    pub request_timeout: u64, // En segundos

    // Caché clave-valor
    pub cache_name: String,
    pub max_cache_size: usize,
    pub cache_timeout: u64, // En segundos
    pub cache_eviction: EvictionPolicy,

    // Router de assets
    pub asset_cache_version: String,
    pub cache_api_responses: bool,

    // Reproductor
    pub default_volume: f32,
    pub history_limit: usize,
    pub mobile_breakpoint: u32,

    // Paths
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // API
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            request_timeout: std::env::var("REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,

            // Caché clave-valor
            cache_name: std::env::var("CACHE_NAME")
                .unwrap_or_else(|_| "streamtube-cache".to_string()),
            max_cache_size: std::env::var("MAX_CACHE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            cache_timeout: std::env::var("CACHE_TIMEOUT")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hora
                .parse()?,
            cache_eviction: match std::env::var("CACHE_EVICTION") {
                Ok(val) if !val.trim().is_empty() => EvictionPolicy::parse(&val)
                    .ok_or_else(|| anyhow::anyhow!("Unknown CACHE_EVICTION policy: {}", val))?,
                _ => EvictionPolicy::default(),
            },

            // Router de assets
            asset_cache_version: std::env::var("ASSET_CACHE_VERSION")
                .unwrap_or_else(|_| "v1".to_string()),
            cache_api_responses: std::env::var("CACHE_API_RESPONSES")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,

            // Reproductor
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.8".to_string())
                .parse()?,
            history_limit: std::env::var("HISTORY_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            mobile_breakpoint: std::env::var("MOBILE_BREAKPOINT")
                .unwrap_or_else(|_| "768".to_string())
                .parse()?,

            // Paths
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
        };

        std::fs::create_dir_all(&config.data_dir)?;

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// - Volume must be between 0.0 and 1.0
    /// - Cache size and TTL must be greater than zero
    /// - History must keep at least one track
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            anyhow::bail!("Default volume must be between 0.0 and 1.0, got: {}", self.default_volume);
        }

        if self.max_cache_size == 0 {
            anyhow::bail!("Cache size must be greater than 0");
        }

        if self.cache_timeout == 0 {
            anyhow::bail!("Cache timeout must be greater than 0");
        }

        if self.history_limit == 0 {
            anyhow::bail!("History limit must be greater than 0");
        }

        if self.asset_cache_version.trim().is_empty() {
            anyhow::bail!("Asset cache version must not be empty");
        }

        url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("Invalid API_BASE_URL '{}': {}", self.api_base_url, e))?;

        Ok(())
    }

    /// TTL por defecto de las entradas de la caché
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_timeout)
    }

    /// Nombre versionado del store de assets, p.ej. `streamtube-v1`
    pub fn asset_cache_name(&self) -> String {
        format!("streamtube-{}", self.asset_cache_version)
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            API: {} ({}s timeout)\n  \
            Cache: '{}' max {} items, {}s TTL, {} eviction\n  \
            Assets: '{}' (API write-back: {})\n  \
            Player: {}% vol, {} history, {}px breakpoint",
            self.api_base_url,
            self.request_timeout,
            self.cache_name,
            self.max_cache_size,
            self.cache_timeout,
            self.cache_eviction,
            self.asset_cache_name(),
            self.cache_api_responses,
            (self.default_volume * 100.0) as u32,
            self.history_limit,
            self.mobile_breakpoint,
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout: 15,

            cache_name: "streamtube-cache".to_string(),
            max_cache_size: 100,
            cache_timeout: 3600,
            cache_eviction: EvictionPolicy::Fifo,

            asset_cache_version: "v1".to_string(),
            cache_api_responses: true,

            default_volume: 0.8,
            history_limit: 10,
            mobile_breakpoint: 768,

            data_dir: "./data".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.asset_cache_name(), "streamtube-v1");
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let config = Config {
            default_volume: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_cache_size() {
        let config = Config {
            max_cache_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_api_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}

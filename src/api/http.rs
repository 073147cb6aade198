use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{
    LikeRequest, LikedResponse, LikedSong, LocationResponse, MusicApi, SearchResponse,
    SearchResult,
};
use crate::{config::Config, error::ApiError, player::Track};

/// Cliente HTTP para la API de StreamTube
#[derive(Debug, Clone)]
pub struct HttpMusicApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpMusicApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("streamtube/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, Duration::from_secs(config.request_timeout))
    }

    fn endpoint(&self, path_and_query: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path_and_query)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path_and_query, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path_and_query: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path_and_query)?;
        debug!("🌐 GET {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MusicApi for HttpMusicApi {
    async fn get_track(&self, id: &str) -> Result<Track, ApiError> {
        self.get_json(&format!("/api/track/{}", urlencoding::encode(id)))
            .await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        info!("🔍 Buscando: {}", query);
        let response: SearchResponse = self
            .get_json(&format!("/api/search?q={}", urlencoding::encode(query)))
            .await?;
        Ok(response.results)
    }

    async fn liked_songs(&self) -> Result<Vec<LikedSong>, ApiError> {
        let response: LikedResponse = self.get_json("/api/liked").await?;
        Ok(response.songs)
    }

    async fn like(&self, song_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint("/api/like")?;
        debug!("🌐 POST {}", url);

        self.client
            .post(url)
            .json(&LikeRequest { song_id })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn location(&self, lat: f64, lon: f64) -> Result<Option<String>, ApiError> {
        let response: LocationResponse = self
            .get_json(&format!("/api/location?lat={}&lon={}", lat, lon))
            .await?;
        Ok(response.city)
    }
}

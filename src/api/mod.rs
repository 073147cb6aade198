//! # API Module
//!
//! Client side of the StreamTube JSON HTTP API. The server is an external
//! collaborator; this module only knows the shapes it answers with.
//!
//! | Endpoint                       | Method                           |
//! |--------------------------------|----------------------------------|
//! | `GET /api/track/{id}`          | [`MusicApi::get_track`]          |
//! | `GET /api/search?q=`           | [`MusicApi::search`]             |
//! | `GET /api/liked`               | [`MusicApi::liked_songs`]        |
//! | `POST /api/like`               | [`MusicApi::like`]               |
//! | `GET /api/location?lat=&lon=`  | [`MusicApi::location`]           |

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ApiError, player::Track};

pub use http::HttpMusicApi;

/// Trait común para el backend HTTP de la aplicación
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MusicApi: Send + Sync {
    /// Metadata completa de un track
    async fn get_track(&self, id: &str) -> Result<Track, ApiError>;

    /// Búsqueda libre
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError>;

    /// Canciones marcadas como favoritas
    async fn liked_songs(&self) -> Result<Vec<LikedSong>, ApiError>;

    /// Alterna el "me gusta" de una canción; solo importa el status
    async fn like(&self, song_id: &str) -> Result<(), ApiError>;

    /// Ciudad aproximada para unas coordenadas
    async fn location(&self, lat: f64, lon: f64) -> Result<Option<String>, ApiError>;
}

/// Resultado de `/api/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: String,
}

/// Elemento de `/api/liked`; el servidor puede omitir cualquier campo salvo el id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedSong {
    pub song_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<Value>,
}

impl LikedSong {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Song")
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikedResponse {
    #[serde(default)]
    pub songs: Vec<LikedSong>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationResponse {
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LikeRequest<'a> {
    pub song_id: &'a str,
}

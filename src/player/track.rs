use serde::{Deserialize, Serialize};

/// Metadata de un track tal como la devuelve `/api/track/{id}`.
///
/// Inmutable una vez obtenido: el reproductor lo reemplaza entero en cada carga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: String,
    pub stream_url: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        thumbnail: impl Into<String>,
        stream_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: thumbnail.into(),
            stream_url: stream_url.into(),
        }
    }
}

use crate::{api::MusicApi, error::ApiError};

/// "Me gusta" optimista como comando de dos fases.
///
/// El reproductor aplica `target()` antes de llamar a [`execute`](Self::execute);
/// si la llamada falla, aplica `previous()`. El mismo comando puede volver a
/// ejecutarse con [`MusicPlayer::retry_like`](super::MusicPlayer::retry_like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeCommand {
    song_id: String,
    previous: bool,
}

impl LikeCommand {
    pub fn new(song_id: impl Into<String>, previous: bool) -> Self {
        Self {
            song_id: song_id.into(),
            previous,
        }
    }

    pub fn song_id(&self) -> &str {
        &self.song_id
    }

    /// Estado anterior al comando
    pub fn previous(&self) -> bool {
        self.previous
    }

    /// Estado que el comando quiere dejar
    pub fn target(&self) -> bool {
        !self.previous
    }

    pub async fn execute(&self, api: &dyn MusicApi) -> Result<(), ApiError> {
        api.like(&self.song_id).await
    }
}

/// Resultado de un toggle de "me gusta"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    /// El servidor confirmó; contiene el estado final
    Confirmed(bool),
    /// El servidor falló y se revirtió; el comando puede reintentarse
    Reverted(LikeCommand),
    /// No hay track actual
    NoTrack,
}

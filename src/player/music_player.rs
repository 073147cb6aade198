use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, error, info, warn};

use super::{
    backend::AudioBackend,
    like::{LikeCommand, LikeOutcome},
    state::{PlayerState, DEFAULT_HISTORY_LIMIT, DEFAULT_VOLUME, PLAYER_STATE_KEY},
    view::{format_time, PlayerView, ERROR_PLACEHOLDER, LOADING_PLACEHOLDER},
    Track,
};
use crate::{
    api::MusicApi,
    cache::CacheManager,
    clock::{Clock, SystemClock},
    config::Config,
};

/// Estado del ciclo de vida del reproductor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Todavía no se ha cargado ningún track
    Idle,
    /// Esperando la metadata de un track
    Loading,
    Playing,
    Paused,
}

/// Qué hizo el reproductor al terminar un track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEndAction {
    /// El bucle nativo ya reinició la fuente
    Looping,
    /// Sin repetición: el track queda detenido
    Stopped,
}

/// Parámetros del reproductor que vienen de la configuración
#[derive(Debug, Clone, Copy)]
pub struct PlayerSettings {
    pub default_volume: f32,
    pub history_limit: usize,
    pub mobile_breakpoint: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            history_limit: DEFAULT_HISTORY_LIMIT,
            mobile_breakpoint: 768,
        }
    }
}

impl From<&Config> for PlayerSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_volume: config.default_volume,
            history_limit: config.history_limit,
            mobile_breakpoint: config.mobile_breakpoint,
        }
    }
}

#[derive(Debug)]
struct PlayerInner {
    status: PlaybackStatus,
    state: PlayerState,
    is_playing: bool,
    is_liked: bool,
}

impl PlayerInner {
    fn settled_status(&self) -> PlaybackStatus {
        match (&self.state.current_track, self.is_playing) {
            (None, _) => PlaybackStatus::Idle,
            (Some(_), true) => PlaybackStatus::Playing,
            (Some(_), false) => PlaybackStatus::Paused,
        }
    }
}

/// Gestor de estado del reproductor.
///
/// Posee el track actual, la cola, el historial y los flags de reproducción;
/// controla un [`AudioBackend`], pinta en un [`PlayerView`] y persiste su
/// estado en la [`CacheManager`] bajo `player_state`.
///
/// El lock interno nunca se mantiene a través de un `.await`.
pub struct MusicPlayer {
    api: Arc<dyn MusicApi>,
    cache: Arc<CacheManager>,
    audio: Arc<dyn AudioBackend>,
    view: Arc<dyn PlayerView>,
    settings: PlayerSettings,
    clock: Arc<dyn Clock>,
    inner: Mutex<PlayerInner>,
    /// Número de secuencia de la última carga emitida
    load_seq: AtomicU64,
}

impl MusicPlayer {
    pub fn new(
        api: Arc<dyn MusicApi>,
        cache: Arc<CacheManager>,
        audio: Arc<dyn AudioBackend>,
        view: Arc<dyn PlayerView>,
        settings: PlayerSettings,
    ) -> Self {
        let state = PlayerState {
            volume: settings.default_volume,
            ..PlayerState::default()
        };
        audio.set_volume(state.volume);

        Self {
            api,
            cache,
            audio,
            view,
            settings,
            clock: Arc::new(SystemClock),
            inner: Mutex::new(PlayerInner {
                status: PlaybackStatus::Idle,
                state,
                is_playing: false,
                is_liked: false,
            }),
            load_seq: AtomicU64::new(0),
        }
    }

    /// Reloj usado para el `timestamp` del snapshot
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Arranque de página: restaura el snapshot, carga el track de la ruta
    /// (`/player/{id}`) si lo hay y consulta si es favorito
    pub async fn restore(&self, path: Option<&str>) {
        self.load_state().await;

        if let Some(id) = path.and_then(track_id_from_path) {
            self.load_track(id).await;
        }

        self.check_if_liked().await;
    }

    /// Carga un track por id; la última llamada emitida es la que gana
    pub async fn load_track(&self, id: &str) -> bool {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;

        self.inner.lock().status = PlaybackStatus::Loading;
        self.view.set_title(LOADING_PLACEHOLDER);
        info!("⏳ Cargando track {} (#{})", id, seq);

        let result = self.api.get_track(id).await;

        if self.load_seq.load(Ordering::SeqCst) != seq {
            debug!("Respuesta descartada para {} (#{}): hay una carga más reciente", id, seq);
            return false;
        }

        let track = match result {
            Ok(track) => track,
            Err(e) => {
                error!("Error loading track {}: {}", id, e);
                self.view.set_title(ERROR_PLACEHOLDER);
                let mut inner = self.inner.lock();
                inner.status = inner.settled_status();
                return false;
            }
        };

        {
            let mut inner = self.inner.lock();
            inner.state.current_track = Some(track.clone());
            inner
                .state
                .push_history(track.clone(), self.settings.history_limit);
            inner.is_playing = false;
            inner.is_liked = false;
            inner.status = PlaybackStatus::Paused;
        }

        self.render_track(&track);
        self.audio.set_source(&track.stream_url);
        self.update_like_button();
        info!("🎵 Reproduciendo: {} - {}", track.title, track.artist);

        self.play().await;
        self.save_state().await;

        if self.view.viewport_width() < self.settings.mobile_breakpoint {
            self.view.open_fullscreen();
        }

        true
    }

    /// Intenta reproducir; si el runtime lo rechaza queda en pausa
    pub async fn play(&self) -> bool {
        match self.audio.play().await {
            Ok(()) => {
                {
                    let mut inner = self.inner.lock();
                    inner.is_playing = true;
                    if inner.status != PlaybackStatus::Loading {
                        inner.status = inner.settled_status();
                    }
                }
                self.update_play_button();
                true
            }
            Err(e) => {
                error!("Playback failed: {}", e);
                let mut inner = self.inner.lock();
                inner.is_playing = false;
                if inner.status != PlaybackStatus::Loading {
                    inner.status = inner.settled_status();
                }
                false
            }
        }
    }

    pub fn pause(&self) {
        self.audio.pause();
        {
            let mut inner = self.inner.lock();
            inner.is_playing = false;
            if inner.status != PlaybackStatus::Loading {
                inner.status = inner.settled_status();
            }
        }
        self.update_play_button();
    }

    pub async fn toggle_play(&self) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play().await
        }
    }

    /// Mapea un clic en la barra de progreso a una posición de reproducción
    pub fn seek(&self, offset: f64, width: f64) {
        if !(width > 0.0) {
            return;
        }

        match self.audio.duration() {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                let position = offset / width * duration;
                self.audio.set_current_time(position);
                debug!("⏩ Seek a {}", format_time(position));
            }
            _ => debug!("Seek ignorado: duración desconocida"),
        }
    }

    /// Aplica el valor del slider de volumen (0–100)
    pub fn set_volume(&self, slider: f32) {
        if !slider.is_finite() {
            warn!("Volumen inválido ignorado: {}", slider);
            return;
        }

        let volume = (slider / 100.0).clamp(0.0, 1.0);
        self.audio.set_volume(volume);
        self.inner.lock().state.volume = volume;
        debug!("🔊 Volumen ajustado a {}%", (volume * 100.0) as u8);
    }

    pub async fn toggle_shuffle(&self) -> bool {
        let shuffled = {
            let mut inner = self.inner.lock();
            inner.state.is_shuffled = !inner.state.is_shuffled;
            inner.state.is_shuffled
        };

        self.view.set_shuffle_indicator(shuffled);
        // TODO: reordenar la cola cuando se defina la semántica de shuffle
        if shuffled {
            info!("🔀 Modo aleatorio activado");
        } else {
            info!("➡️ Modo aleatorio desactivado");
        }

        self.save_state().await;
        shuffled
    }

    pub async fn toggle_repeat(&self) -> bool {
        let repeated = {
            let mut inner = self.inner.lock();
            inner.state.is_repeated = !inner.state.is_repeated;
            inner.state.is_repeated
        };

        self.audio.set_loop(repeated);
        self.view.set_repeat_indicator(repeated);
        if repeated {
            info!("🔂 Repetir canción activado");
        } else {
            info!("➡️ Repetición desactivada");
        }

        self.save_state().await;
        repeated
    }

    /// Alterna "me gusta" de forma optimista y revierte si el POST falla
    pub async fn toggle_like(&self) -> LikeOutcome {
        let command = {
            let inner = self.inner.lock();
            match &inner.state.current_track {
                Some(track) => LikeCommand::new(track.id.clone(), inner.is_liked),
                None => {
                    warn!("toggle_like sin track actual");
                    return LikeOutcome::NoTrack;
                }
            }
        };

        self.run_like(command).await
    }

    /// Vuelve a aplicar y ejecutar un comando revertido
    pub async fn retry_like(&self, command: LikeCommand) -> LikeOutcome {
        self.run_like(command).await
    }

    async fn run_like(&self, command: LikeCommand) -> LikeOutcome {
        self.apply_like(command.target());

        match command.execute(self.api.as_ref()).await {
            Ok(()) => LikeOutcome::Confirmed(command.target()),
            Err(e) => {
                error!("Failed to update like status for {}: {}", command.song_id(), e);
                {
                    let mut inner = self.inner.lock();
                    // Solo compensar si nadie cambió el flag mientras tanto
                    if inner.is_liked == command.target() {
                        inner.is_liked = command.previous();
                    }
                }
                self.update_like_button();
                LikeOutcome::Reverted(command)
            }
        }
    }

    fn apply_like(&self, liked: bool) {
        self.inner.lock().is_liked = liked;
        self.update_like_button();
    }

    /// Consulta `/api/liked` y marca el track actual si aparece
    pub async fn check_if_liked(&self) {
        let Some(id) = self.current_track().map(|t| t.id) else {
            return;
        };

        match self.api.liked_songs().await {
            Ok(songs) => {
                let liked = songs.iter().any(|song| song.song_id == id);
                {
                    let mut inner = self.inner.lock();
                    // La carga pudo cambiar de track mientras esperábamos
                    if inner.state.current_track.as_ref().map(|t| t.id.as_str()) != Some(id.as_str()) {
                        return;
                    }
                    inner.is_liked = liked;
                }
                self.update_like_button();
            }
            Err(e) => error!("Error checking liked status: {}", e),
        }
    }

    /// Fin natural del track
    pub fn on_track_end(&self) -> TrackEndAction {
        if self.inner.lock().state.is_repeated {
            debug!("🔂 Track terminado, el bucle nativo lo reinicia");
            return TrackEndAction::Looping;
        }

        // TODO: avanzar al siguiente track de la cola cuando se confirme el comportamiento
        info!("Song ended - play next track");
        {
            let mut inner = self.inner.lock();
            inner.is_playing = false;
            inner.status = inner.settled_status();
        }
        self.update_play_button();
        TrackEndAction::Stopped
    }

    /// Agrega un track al final de la cola (orden de inserción = orden de reproducción)
    pub fn enqueue(&self, track: Track) {
        info!("➕ Agregado a la cola: {}", track.title);
        self.inner.lock().state.queue.push(track);
    }

    /// Persiste el snapshot completo bajo `player_state`
    pub async fn save_state(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.state.timestamp = self.clock.now_millis();
            inner.state.clone()
        };

        self.cache.set(PLAYER_STATE_KEY, &snapshot).await;
        debug!("💾 Estado del reproductor guardado");
    }

    /// Restaura el snapshot; devuelve si había uno
    pub async fn load_state(&self) -> bool {
        let Some(mut state) = self.cache.get_as::<PlayerState>(PLAYER_STATE_KEY).await else {
            debug!("Sin estado previo del reproductor");
            return false;
        };

        state.sanitize(self.settings.history_limit);
        let restored = state.current_track.clone();
        let (volume, shuffled, repeated) = (state.volume, state.is_shuffled, state.is_repeated);

        {
            let mut inner = self.inner.lock();
            inner.state = state;
            inner.is_playing = false;
            inner.status = inner.settled_status();
        }

        self.audio.set_volume(volume);
        self.audio.set_loop(repeated);
        self.view.set_shuffle_indicator(shuffled);
        self.view.set_repeat_indicator(repeated);

        if let Some(track) = restored {
            self.audio.set_source(&track.stream_url);
            self.render_track(&track);
            info!("📂 Estado restaurado: {}", track.title);
        }

        true
    }

    // Renderers

    pub fn update_progress(&self) {
        let current = self.audio.current_time();
        let percent = match self.audio.duration() {
            Some(duration) if duration.is_finite() && duration > 0.0 => current / duration * 100.0,
            _ => 0.0,
        };
        self.view.set_progress(percent, &format_time(current));
    }

    pub fn update_total_time(&self) {
        let total = self.audio.duration().unwrap_or(f64::NAN);
        self.view.set_total_time(&format_time(total));
    }

    pub fn update_play_button(&self) {
        self.view.set_play_icon(self.is_playing());
    }

    pub fn update_like_button(&self) {
        self.view.set_like(self.is_liked());
    }

    fn render_track(&self, track: &Track) {
        self.view.set_title(&track.title);
        self.view.set_artist(&track.artist);
        self.view.set_artwork(&track.thumbnail);
    }

    // Getters

    pub fn status(&self) -> PlaybackStatus {
        self.inner.lock().status
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().is_playing
    }

    pub fn is_liked(&self) -> bool {
        self.inner.lock().is_liked
    }

    pub fn is_shuffled(&self) -> bool {
        self.inner.lock().state.is_shuffled
    }

    pub fn is_repeated(&self) -> bool {
        self.inner.lock().state.is_repeated
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().state.volume
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.lock().state.current_track.clone()
    }

    pub fn queue(&self) -> Vec<Track> {
        self.inner.lock().state.queue.clone()
    }

    pub fn history(&self) -> Vec<Track> {
        self.inner.lock().state.history.clone()
    }

    /// Copia del estado persistible actual
    pub fn snapshot(&self) -> PlayerState {
        self.inner.lock().state.clone()
    }
}

impl std::fmt::Debug for MusicPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicPlayer")
            .field("settings", &self.settings)
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

/// Extrae el id de una ruta `/player/{id}`
pub fn track_id_from_path(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let id = path.strip_prefix("/player/")?.trim_end_matches('/');

    if id.is_empty() || id.contains('/') {
        None
    } else {
        Some(id)
    }
}

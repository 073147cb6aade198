use parking_lot::Mutex;
use tracing::{debug, info};

/// Texto del título mientras se pide la metadata
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Texto del título cuando la carga falla
pub const ERROR_PLACEHOLDER: &str = "Error loading track";

/// Superficie de render del reproductor.
///
/// Todas las llamadas son efectos secundarios sin condiciones de error.
pub trait PlayerView: Send + Sync {
    fn set_title(&self, title: &str);
    fn set_artist(&self, artist: &str);
    fn set_artwork(&self, url: &str);
    fn set_play_icon(&self, playing: bool);
    fn set_like(&self, liked: bool);
    fn set_shuffle_indicator(&self, active: bool);
    fn set_repeat_indicator(&self, active: bool);
    fn set_progress(&self, percent: f64, current: &str);
    fn set_total_time(&self, total: &str);
    fn open_fullscreen(&self);
    fn viewport_width(&self) -> u32;
}

/// Formatea segundos como `m:ss`; `0:00` si no hay un valor válido
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", mins, secs)
}

/// Lo último que se ha pintado en la vista
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub title: String,
    pub artist: String,
    pub artwork: String,
    pub playing: bool,
    pub liked: bool,
    pub shuffle_active: bool,
    pub repeat_active: bool,
    pub progress_percent: f64,
    pub current_time: String,
    pub total_time: String,
    pub fullscreen: bool,
}

/// Vista en memoria que recuerda el último render
#[derive(Debug)]
pub struct RecordingView {
    viewport_width: u32,
    snapshot: Mutex<ViewSnapshot>,
}

impl RecordingView {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            viewport_width,
            snapshot: Mutex::new(ViewSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.lock().clone()
    }
}

impl PlayerView for RecordingView {
    fn set_title(&self, title: &str) {
        self.snapshot.lock().title = title.to_string();
    }

    fn set_artist(&self, artist: &str) {
        self.snapshot.lock().artist = artist.to_string();
    }

    fn set_artwork(&self, url: &str) {
        self.snapshot.lock().artwork = url.to_string();
    }

    fn set_play_icon(&self, playing: bool) {
        self.snapshot.lock().playing = playing;
    }

    fn set_like(&self, liked: bool) {
        self.snapshot.lock().liked = liked;
    }

    fn set_shuffle_indicator(&self, active: bool) {
        self.snapshot.lock().shuffle_active = active;
    }

    fn set_repeat_indicator(&self, active: bool) {
        self.snapshot.lock().repeat_active = active;
    }

    fn set_progress(&self, percent: f64, current: &str) {
        let mut snapshot = self.snapshot.lock();
        snapshot.progress_percent = percent;
        snapshot.current_time = current.to_string();
    }

    fn set_total_time(&self, total: &str) {
        self.snapshot.lock().total_time = total.to_string();
    }

    fn open_fullscreen(&self) {
        self.snapshot.lock().fullscreen = true;
    }

    fn viewport_width(&self) -> u32 {
        self.viewport_width
    }
}

/// Vista del binario headless: cada render va al log
#[derive(Debug, Clone, Copy)]
pub struct TracingView {
    viewport_width: u32,
}

impl TracingView {
    pub fn new(viewport_width: u32) -> Self {
        Self { viewport_width }
    }
}

impl PlayerView for TracingView {
    fn set_title(&self, title: &str) {
        info!("🎵 {}", title);
    }

    fn set_artist(&self, artist: &str) {
        info!("🎤 {}", artist);
    }

    fn set_artwork(&self, url: &str) {
        debug!("🖼️ {}", url);
    }

    fn set_play_icon(&self, playing: bool) {
        info!("{}", if playing { "▶️ Reproduciendo" } else { "⏸️ En pausa" });
    }

    fn set_like(&self, liked: bool) {
        info!("{}", if liked { "❤️ Me gusta" } else { "🤍 Sin me gusta" });
    }

    fn set_shuffle_indicator(&self, active: bool) {
        info!("🔀 Aleatorio: {}", active);
    }

    fn set_repeat_indicator(&self, active: bool) {
        info!("🔂 Repetir: {}", active);
    }

    fn set_progress(&self, percent: f64, current: &str) {
        debug!("⏱️ {} ({:.1}%)", current, percent);
    }

    fn set_total_time(&self, total: &str) {
        debug!("⏱️ Duración: {}", total);
    }

    fn open_fullscreen(&self) {
        info!("📱 Abriendo reproductor a pantalla completa");
    }

    fn viewport_width(&self) -> u32 {
        self.viewport_width
    }
}

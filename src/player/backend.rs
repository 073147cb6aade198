use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::PlaybackError;

/// Primitiva de reproducción (el equivalente al elemento `<audio>`)
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Cambia la fuente; detiene lo que se estuviera reproduciendo
    fn set_source(&self, url: &str);

    /// Intenta iniciar la reproducción; el runtime puede rechazarla
    async fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn set_volume(&self, volume: f32);

    /// Bucle nativo: al terminar vuelve a empezar sin intervención
    fn set_loop(&self, enabled: bool);

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// Duración en segundos, `None` mientras no se conozca
    fn duration(&self) -> Option<f64>;
}

/// Qué ocurrió al avanzar el tiempo de una fuente simulada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Sigue reproduciendo
    Progressed,
    /// Llegó al final y el bucle nativo la reinició
    Looped,
    /// Llegó al final y se detuvo
    Ended,
    /// No estaba reproduciendo
    Idle,
}

#[derive(Debug, Clone, Default)]
struct SimulatedState {
    source: Option<String>,
    playing: bool,
    volume: f32,
    looping: bool,
    position: f64,
    duration: Option<f64>,
    autoplay_blocked: bool,
}

/// Backend sin salida de audio: mantiene posición, volumen y bucle en memoria.
///
/// Sirve para el binario headless y para las pruebas.
#[derive(Debug, Default)]
pub struct SimulatedAudio {
    state: Mutex<SimulatedState>,
}

impl SimulatedAudio {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                volume: 1.0,
                ..SimulatedState::default()
            }),
        }
    }

    /// Simula la llegada de `loadedmetadata`
    pub fn set_duration(&self, seconds: f64) {
        self.state.lock().duration = Some(seconds);
    }

    /// Simula que el runtime rechace `play()` (sin gesto del usuario)
    pub fn block_autoplay(&self, blocked: bool) {
        self.state.lock().autoplay_blocked = blocked;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn is_looping(&self) -> bool {
        self.state.lock().looping
    }

    /// Avanza el reloj de reproducción `seconds` segundos
    pub fn advance(&self, seconds: f64) -> PlaybackEvent {
        let mut state = self.state.lock();
        if !state.playing {
            return PlaybackEvent::Idle;
        }

        state.position += seconds;

        match state.duration {
            Some(duration) if state.position >= duration => {
                if state.looping {
                    state.position = 0.0;
                    debug!("🔂 Bucle nativo: reiniciando fuente");
                    PlaybackEvent::Looped
                } else {
                    state.position = duration;
                    state.playing = false;
                    PlaybackEvent::Ended
                }
            }
            _ => PlaybackEvent::Progressed,
        }
    }
}

#[async_trait]
impl AudioBackend for SimulatedAudio {
    fn set_source(&self, url: &str) {
        let mut state = self.state.lock();
        state.source = Some(url.to_string());
        state.playing = false;
        state.position = 0.0;
        state.duration = None;
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if state.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        if state.autoplay_blocked {
            return Err(PlaybackError::Rejected(
                "play() requires a user gesture".to_string(),
            ));
        }

        state.playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().playing = false;
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn set_loop(&self, enabled: bool) {
        self.state.lock().looping = enabled;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().position
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.lock().position = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }
}

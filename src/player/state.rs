use serde::{Deserialize, Serialize};

use super::Track;

/// Clave fija del snapshot del reproductor en la caché
pub const PLAYER_STATE_KEY: &str = "player_state";

/// Volumen cuando el snapshot no lo incluye
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Máximo de tracks en el historial
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

/// Snapshot persistido del reproductor.
///
/// Cualquier campo ausente en un snapshot antiguo toma su valor por defecto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default)]
    pub current_track: Option<Track>,
    #[serde(default)]
    pub queue: Vec<Track>,
    #[serde(default)]
    pub history: Vec<Track>,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub is_shuffled: bool,
    #[serde(default)]
    pub is_repeated: bool,
    /// Momento del último guardado, ms desde epoch
    #[serde(default)]
    pub timestamp: i64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            queue: Vec::new(),
            history: Vec::new(),
            volume: DEFAULT_VOLUME,
            is_shuffled: false,
            is_repeated: false,
            timestamp: 0,
        }
    }
}

impl PlayerState {
    /// Agrega al historial descartando los más antiguos por encima de `limit`
    pub fn push_history(&mut self, track: Track, limit: usize) {
        self.history.push(track);

        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    /// Fuerza los invariantes tras leer un snapshot externo
    pub fn sanitize(&mut self, history_limit: usize) {
        if !self.volume.is_finite() {
            self.volume = DEFAULT_VOLUME;
        }
        self.volume = self.volume.clamp(0.0, 1.0);

        if self.history.len() > history_limit {
            let excess = self.history.len() - history_limit;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Song {}", id), "Artist", "", format!("https://s/{}", id))
    }

    #[test]
    fn history_keeps_most_recent_ten() {
        let mut state = PlayerState::default();
        for i in 0..15 {
            state.push_history(track(&i.to_string()), DEFAULT_HISTORY_LIMIT);
        }

        assert_eq!(state.history.len(), 10);
        assert_eq!(state.history.first().unwrap().id, "5");
        assert_eq!(state.history.last().unwrap().id, "14");
    }

    #[test]
    fn old_snapshot_fills_defaults() {
        let state: PlayerState = serde_json::from_value(json!({
            "currentTrack": null,
            "isShuffled": true
        }))
        .unwrap();

        assert_eq!(state.volume, 0.8);
        assert!(state.is_shuffled);
        assert!(!state.is_repeated);
        assert!(state.queue.is_empty());
        assert!(state.history.is_empty());
    }

    #[test]
    fn sanitize_enforces_invariants() {
        let mut state = PlayerState {
            volume: 3.0,
            history: (0..12).map(|i| track(&i.to_string())).collect(),
            ..PlayerState::default()
        };
        state.sanitize(10);

        assert_eq!(state.volume, 1.0);
        assert_eq!(state.history.len(), 10);
        assert_eq!(state.history[0].id, "2");
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let state = PlayerState {
            current_track: Some(track("a")),
            is_repeated: true,
            timestamp: 42,
            ..PlayerState::default()
        };
        let encoded = serde_json::to_value(&state).unwrap();

        assert_eq!(encoded["currentTrack"]["streamUrl"], json!("https://s/a"));
        assert_eq!(encoded["isRepeated"], json!(true));
        assert_eq!(encoded["timestamp"], json!(42));
    }
}

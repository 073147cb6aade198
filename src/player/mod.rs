//! # Player Module
//!
//! Client-side media player state manager.
//!
//! ## Architecture
//!
//! ### [`music_player`] - State Manager
//! - Owns the current track, queue, history and playback flags
//! - Loads track metadata with last-call-wins sequencing
//! - Persists a [`PlayerState`] snapshot through the key-value cache
//!
//! ### [`backend`] - Audio Primitive
//! - [`AudioBackend`] abstracts the native media element
//! - [`SimulatedAudio`] keeps position, volume and loop in memory
//!
//! ### [`view`] - Rendering
//! - [`PlayerView`] receives every UI update as a side effect
//! - [`RecordingView`] and [`TracingView`] for tests and the headless binary
//!
//! ### [`like`] - Optimistic Likes
//! - [`LikeCommand`] models apply / execute / compensate
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use streamtube::{
//!     api::HttpMusicApi,
//!     cache::CacheManager,
//!     player::{MusicPlayer, PlayerSettings, SimulatedAudio, TracingView},
//!     storage::MemoryStore,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let api = Arc::new(HttpMusicApi::new("http://localhost:8080", std::time::Duration::from_secs(15))?);
//! let cache = Arc::new(CacheManager::new(Arc::new(MemoryStore::new()), "streamtube-cache", 100));
//! let player = MusicPlayer::new(
//!     api,
//!     cache,
//!     Arc::new(SimulatedAudio::new()),
//!     Arc::new(TracingView::new(1280)),
//!     PlayerSettings::default(),
//! );
//!
//! player.restore(Some("/player/abc123")).await;
//! player.toggle_repeat().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod like;
pub mod music_player;
pub mod state;
pub mod track;
pub mod view;

pub use backend::{AudioBackend, PlaybackEvent, SimulatedAudio};
pub use like::{LikeCommand, LikeOutcome};
pub use music_player::{
    track_id_from_path, MusicPlayer, PlaybackStatus, PlayerSettings, TrackEndAction,
};
pub use state::{PlayerState, PLAYER_STATE_KEY};
pub use track::Track;
pub use view::{format_time, PlayerView, RecordingView, TracingView, ViewSnapshot};

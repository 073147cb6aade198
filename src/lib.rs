//! # StreamTube
//!
//! Headless core of the StreamTube music front end:
//!
//! - [`cache`]: TTL key-value cache over a persistent [`storage::CacheStore`]
//! - [`player`]: music player state manager with persistence and optimistic likes
//! - [`router`]: request router with versioned offline asset cache
//! - [`api`]: HTTP client for the StreamTube backend
//!
//! Everything that touches the outside world sits behind a trait
//! ([`api::MusicApi`], [`player::AudioBackend`], [`player::PlayerView`],
//! [`router::Fetcher`], [`storage::CacheStore`], [`clock::Clock`]) so each
//! component can run against in-memory implementations.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod player;
pub mod router;
pub mod storage;

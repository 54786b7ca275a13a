//! nowbar-mpris - zbus MPRIS player watcher
//!
//! Tracks allowlisted players on the session bus and reports a fresh
//! track snapshot whenever one of them changes metadata or playback
//! status.

pub mod error;
pub mod types;
pub mod watcher;

pub use error::WatcherError;
pub use types::{PlaybackStatus, TrackSnapshot};
pub use watcher::PlayerWatcher;

//! Core types for nowbar-mpris

/// Playback status from an MPRIS player
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlaybackStatus {
    /// MPRIS only defines these three values; anything else reads as stopped.
    pub fn from_str(s: &str) -> Self {
        match s {
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            _ => PlaybackStatus::Stopped,
        }
    }

    /// Lowercase label for display.
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        }
    }
}

/// Track state read fresh from a player on every change signal.
///
/// Fields that could not be read are empty strings; the watcher has
/// already logged the failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackSnapshot {
    /// Short player name, e.g. "spotify"
    pub player: String,
    pub status: PlaybackStatus,
    pub title: String,
    pub artist: String,
    pub album: String,
}

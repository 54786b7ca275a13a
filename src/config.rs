//! Compile-time configuration. No flags, no env vars, no files.

/// Players to attach to, by short MPRIS name.
pub const SUPPORTED_PLAYERS: &[&str] = &["spotify", "mpv", "vlc", "firefox"];

/// Base display width of the title field.
pub const TITLE_LENGTH: usize = 20;

/// Base display width of the artist field.
pub const ARTIST_LENGTH: usize = 20;

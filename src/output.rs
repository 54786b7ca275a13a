//! Presenter: track snapshot in, one waybar JSON line out.

use std::io::Write;

use log::warn;
use nowbar_mpris::TrackSnapshot;
use serde::Serialize;

use crate::config::{ARTIST_LENGTH, TITLE_LENGTH};
use crate::format::{edit_title, padded_width, truncate};

/// One waybar custom-module update.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tooltip: String,
}

/// Render a snapshot, or nothing when there is no title to show.
///
/// The bar text holds the truncated title and artist; each field's
/// width is its base plus whatever the other field leaves unused. The
/// tooltip carries the untruncated fields.
pub fn render(snapshot: &TrackSnapshot) -> Option<StatusLine> {
    if snapshot.title.is_empty() {
        return None;
    }

    let title = edit_title(&snapshot.title);
    let artist = &snapshot.artist;

    let title_width = padded_width(TITLE_LENGTH, ARTIST_LENGTH, artist.chars().count());
    let artist_width = padded_width(ARTIST_LENGTH, TITLE_LENGTH, title.chars().count());
    let text_title = truncate(&title, title_width);
    let text_artist = truncate(artist, artist_width);

    Some(StatusLine {
        text: format!("{text_title} - {text_artist}"),
        tooltip: format!(
            "{} ({}): {} - {} - {}",
            snapshot.player,
            snapshot.status.as_str(),
            title,
            artist,
            snapshot.album
        ),
    })
}

/// Print one JSON line for `snapshot`, flushed immediately. Empty-title
/// snapshots produce no output at all.
pub fn emit(snapshot: TrackSnapshot) {
    let Some(line) = render(&snapshot) else {
        return;
    };

    match serde_json::to_string(&line) {
        Ok(json) => {
            let mut stdout = std::io::stdout().lock();
            if writeln!(stdout, "{json}")
                .and_then(|()| stdout.flush())
                .is_err()
            {
                warn!("Error writing status line to stdout");
            }
        }
        Err(e) => warn!("Error serializing status line: {e}"),
    }
}

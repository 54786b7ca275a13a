//! Pure string editing for the bar text.

const ELLIPSIS: char = '\u{2026}';

/// Chars reserved for the ellipsis when truncating.
const ELLIPSIS_RESERVE: usize = 3;

/// Cut `title` at the first occurrence of `marker`, dropping one
/// preceding space if there is one. Identity when absent.
fn strip_marker(title: &str, marker: &str) -> String {
    match title.find(marker) {
        Some(mut position) => {
            if position > 0 && title.as_bytes()[position - 1] == b' ' {
                position -= 1;
            }
            title[..position].to_string()
        }
        None => title.to_string(),
    }
}

/// Remove a trailing "(ft ...)" or "(feat ...)" credit from a title.
pub fn edit_title(title: &str) -> String {
    let title = strip_marker(title, "(ft");
    strip_marker(&title, "(feat")
}

/// Character-count truncation with a trailing ellipsis. The kept prefix
/// is `max_width - 3` chars, clamped to at least 1 so narrow widths
/// still show something instead of underflowing.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }

    let keep = max_width.saturating_sub(ELLIPSIS_RESERVE).max(1);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// Usable width for one field: its own base, plus whatever of the other
/// field's base its actual content leaves unused.
pub fn padded_width(base: usize, other_base: usize, other_len: usize) -> usize {
    base + other_base.saturating_sub(other_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_title_ft() {
        assert_eq!(edit_title("Song (ft Artist)"), "Song");
        assert_eq!(edit_title("Song (ft. Artist)"), "Song");
    }

    #[test]
    fn test_edit_title_feat() {
        assert_eq!(edit_title("Song (feat. Artist)"), "Song");
        assert_eq!(edit_title("Song (feat Artist)"), "Song");
    }

    #[test]
    fn test_edit_title_identity() {
        assert_eq!(edit_title("Plain Song"), "Plain Song");
        assert_eq!(edit_title(""), "");
    }

    #[test]
    fn test_edit_title_no_preceding_space() {
        assert_eq!(edit_title("Song(ft Artist)"), "Song");
        assert_eq!(edit_title("(ft Artist)"), "");
    }

    #[test]
    fn test_truncate_over_width() {
        assert_eq!(truncate("Hello World", 8), "Hello\u{2026}");
    }

    #[test]
    fn test_truncate_under_width() {
        assert_eq!(truncate("Short", 20), "Short");
        assert_eq!(truncate("Exact", 5), "Exact");
    }

    #[test]
    fn test_truncate_narrow_width_clamps() {
        assert_eq!(truncate("abcdef", 2), "a\u{2026}");
        assert_eq!(truncate("abcdef", 0), "a\u{2026}");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("áéíóú vocal", 8), "áéíóú\u{2026}");
        assert_eq!(truncate("áéíóú", 5), "áéíóú");
    }

    #[test]
    fn test_padded_width() {
        // Other field shorter than its base: shortfall is granted
        assert_eq!(padded_width(20, 20, 4), 36);
        assert_eq!(padded_width(20, 15, 10), 25);
        // Other field at or over its base: no extra
        assert_eq!(padded_width(20, 20, 20), 20);
        assert_eq!(padded_width(20, 20, 31), 20);
        assert_eq!(padded_width(20, 20, 0), 40);
    }
}

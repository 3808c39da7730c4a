//! Yandex Music link recognition.

use std::{fmt, sync::OnceLock};

use regex::Regex;

/// Links must start with one of these to be considered at all.
pub const ACCEPTED_PREFIXES: [&str; 2] = ["https://music.yandex.ru/", "http://music.yandex.ru/"];

const TRACK_PATTERN: &str = r"track/(\d+)";
const ALBUM_PATTERN: &str = r"album/(\d+)$";

// Recognized shapes with no handler. Links of these shapes classify as `Unknown`.
#[allow(dead_code)]
const ARTIST_PATTERN: &str = r"artist/(\d+)$";
#[allow(dead_code)]
const PLAYLIST_PATTERN: &str = r"([\w\-._@]+)/playlists/(\d+)$";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Track,
    Album,
    Unknown,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Track => "track",
            ContentType::Album => "album",
            ContentType::Unknown => "unknown",
        })
    }
}

fn track_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TRACK_PATTERN).expect("valid track pattern"))
}

fn album_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ALBUM_PATTERN).expect("valid album pattern"))
}

pub fn is_supported_link(text: &str) -> bool {
    ACCEPTED_PREFIXES.iter().any(|p| text.starts_with(p))
}

/// Classify a link by its path alone.
///
/// The album pattern is anchored at the end of the path and checked first, so
/// `/album/1` is an album while `/album/1/track/2` is a track.
pub fn classify(raw: &str) -> ContentType {
    let path = url_path(raw);
    if album_re().is_match(path) {
        ContentType::Album
    } else if track_re().is_match(path) {
        ContentType::Track
    } else {
        ContentType::Unknown
    }
}

/// Numeric id of the track a link points at, if it has one.
pub fn track_id(raw: &str) -> Option<String> {
    capture_id(track_re(), raw)
}

/// Numeric id of an album link (`.../album/<id>` at the end of the path).
pub fn album_id(raw: &str) -> Option<String> {
    capture_id(album_re(), raw)
}

fn capture_id(re: &Regex, raw: &str) -> Option<String> {
    re.captures(url_path(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Path component of a URL, split out lexically: no percent-decoding, no
/// dot-segment resolution, no character stripping.
fn url_path(raw: &str) -> &str {
    let mut rest = raw;

    // scheme ":"
    if let Some(colon) = rest.find(':') {
        let scheme = &rest[..colon];
        let valid = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            rest = &rest[colon + 1..];
        }
    }

    // "//" authority
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find(['/', '?', '#']).unwrap_or(after.len());
        rest = &after[end..];
    }

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_link_ending_in_id_is_album() {
        assert_eq!(
            classify("https://music.yandex.ru/album/12345"),
            ContentType::Album
        );
        assert_eq!(
            classify("http://music.yandex.ru/album/1?utm_source=share"),
            ContentType::Album
        );
    }

    #[test]
    fn track_inside_album_is_track() {
        assert_eq!(
            classify("https://music.yandex.ru/album/12345/track/54321"),
            ContentType::Track
        );
        assert_eq!(
            classify("https://music.yandex.ru/track/54321"),
            ContentType::Track
        );
    }

    #[test]
    fn album_anchor_requires_id_at_end_of_path() {
        assert_eq!(
            classify("https://music.yandex.ru/album/12345/"),
            ContentType::Unknown
        );
        assert_eq!(
            classify("https://music.yandex.ru/album/abc"),
            ContentType::Unknown
        );
    }

    #[test]
    fn album_at_end_wins_over_earlier_track_segment() {
        assert_eq!(
            classify("https://music.yandex.ru/track/9/album/12345"),
            ContentType::Album
        );
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(
            classify("https://music.yandex.ru/users/x/playlists/3?track/5"),
            ContentType::Unknown
        );
        assert_eq!(
            classify("https://music.yandex.ru/album/1#track/2"),
            ContentType::Album
        );
    }

    #[test]
    fn artist_and_playlist_links_are_unknown() {
        assert_eq!(
            classify("https://music.yandex.ru/artist/777"),
            ContentType::Unknown
        );
        assert_eq!(
            classify("https://music.yandex.ru/users/someone/playlists/1000"),
            ContentType::Unknown
        );
        // The dormant patterns themselves are valid.
        assert!(Regex::new(ARTIST_PATTERN).is_ok());
        assert!(Regex::new(PLAYLIST_PATTERN).is_ok());
    }

    #[test]
    fn non_url_input_still_yields_a_path() {
        assert_eq!(classify("album/7?x=1"), ContentType::Album);
        assert_eq!(classify("nothing here"), ContentType::Unknown);
    }

    #[test]
    fn path_is_taken_verbatim() {
        // Dot segments are not resolved, so the track segment survives.
        assert_eq!(
            classify("https://music.yandex.ru/album/1/track/2/.."),
            ContentType::Track
        );
        assert_eq!(
            classify("https://music.yandex.ru/album/1/./"),
            ContentType::Unknown
        );
        assert_eq!(url_path("https://music.yandex.ru"), "");
        assert_eq!(
            url_path("http://music.yandex.ru/album/3?x=/album/4#y"),
            "/album/3"
        );
    }

    #[test]
    fn ids_are_extracted_from_links() {
        assert_eq!(
            track_id("https://music.yandex.ru/album/1/track/54321?utm=x"),
            Some("54321".to_string())
        );
        assert_eq!(
            album_id("https://music.yandex.ru/album/12345"),
            Some("12345".to_string())
        );
        assert_eq!(album_id("https://music.yandex.ru/album/1/track/2"), None);
        assert_eq!(track_id("https://music.yandex.ru/artist/7"), None);
    }

    #[test]
    fn only_yandex_music_prefixes_are_supported() {
        assert!(is_supported_link("https://music.yandex.ru/album/1"));
        assert!(is_supported_link("http://music.yandex.ru/"));
        assert!(!is_supported_link("https://music.yandex.com/album/1"));
        assert!(!is_supported_link("music.yandex.ru/album/1"));
        assert!(!is_supported_link(" https://music.yandex.ru/album/1"));
    }
}

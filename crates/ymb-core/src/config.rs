use std::{collections::BTreeSet, env, fmt, path::PathBuf};

use crate::{errors::Error, Result};

/// Audio quality requested from the downloader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// AAC 64kbps.
    Low = 0,
    /// AAC 192kbps.
    Medium = 1,
    /// FLAC.
    Lossless = 2,
}

impl Quality {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Quality::Low),
            1 => Some(Quality::Medium),
            2 => Some(Quality::Lossless),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Quality::Low => "Low (AAC 64kbps)",
            Quality::Medium => "Optimal (AAC 192kbps)",
            Quality::Lossless => "Best (FLAC)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LyricsFormat {
    None,
    Text,
    /// Synced lyrics.
    Lrc,
}

impl LyricsFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" => Some(LyricsFormat::None),
            "text" => Some(LyricsFormat::Text),
            "lrc" => Some(LyricsFormat::Lrc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LyricsFormat::None => "none",
            LyricsFormat::Text => "text",
            LyricsFormat::Lrc => "lrc",
        }
    }
}

impl fmt::Display for LyricsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target size for embedded cover art.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoverResolution {
    Original,
    /// Decimal digits, passed through to the downloader as written.
    Pixels(String),
}

impl CoverResolution {
    /// Accepts the case-insensitive literal `original` or a string of decimal digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let lower = raw.to_lowercase();
        if lower == "original" {
            return Ok(CoverResolution::Original);
        }
        if lower.is_empty() || !lower.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Config(format!(
                "COVER_RESOLUTION must be \"original\" or a number, got {raw:?}"
            )));
        }
        Ok(CoverResolution::Pixels(lower))
    }
}

impl fmt::Display for CoverResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverResolution::Original => f.write_str("original"),
            CoverResolution::Pixels(n) => f.write_str(n),
        }
    }
}

/// Typed, validated configuration. Built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_token: String,
    pub yandex_music_token: String,

    // Access
    pub allowed_user_ids: BTreeSet<i64>,

    // Download parameters
    pub quality: Quality,
    pub skip_existing: bool,
    pub lyrics_format: LyricsFormat,
    pub embed_cover: bool,
    pub cover_resolution: CoverResolution,
    pub delay: f64,
    pub stick_to_artist: bool,
    pub only_music: bool,
    pub compatibility_level: f64,

    // Paths
    pub download_dir: PathBuf,
    pub downloader_path: PathBuf,
}

impl Config {
    /// Load from the process environment, with `.env` (if present) filling in
    /// variables that are not already set.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("failed to read .env: {e}"))),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_token = required(&lookup, "TELEGRAM_TOKEN")?;
        let yandex_music_token = required(&lookup, "YANDEX_MUSIC_TOKEN")?;
        let allowed_user_ids = parse_user_ids(&required(&lookup, "ALLOWED_USER_IDS")?)?;

        let quality = match lookup("QUALITY") {
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(Quality::from_level)
                .ok_or_else(|| {
                    Error::Config(format!("QUALITY must be one of 0, 1, 2, got {raw:?}"))
                })?,
            None => Quality::Lossless,
        };

        let lyrics_format = match lookup("LYRICS_FORMAT") {
            Some(raw) => LyricsFormat::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "LYRICS_FORMAT must be one of none, text, lrc, got {raw:?}"
                ))
            })?,
            None => LyricsFormat::Text,
        };

        let cover_resolution = match lookup("COVER_RESOLUTION") {
            Some(raw) => CoverResolution::parse(&raw)?,
            None => CoverResolution::Original,
        };

        let delay = parse_f64(&lookup, "DELAY")?.unwrap_or(0.0);
        if delay < 0.0 {
            return Err(Error::Config(format!(
                "DELAY must be non-negative, got {delay}"
            )));
        }
        let compatibility_level = parse_f64(&lookup, "COMPATIBILITY_LEVEL")?.unwrap_or(1.0);

        let download_dir = lookup("DOWNLOAD_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./downloads"));
        let downloader_path = lookup("DOWNLOADER_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("yandex-music-downloader"));

        Ok(Self {
            telegram_token,
            yandex_music_token,
            allowed_user_ids,
            quality,
            skip_existing: parse_bool(&lookup, "SKIP_EXISTING")?.unwrap_or(true),
            lyrics_format,
            embed_cover: parse_bool(&lookup, "EMBED_COVER")?.unwrap_or(true),
            cover_resolution,
            delay,
            stick_to_artist: parse_bool(&lookup, "STICK_TO_ARTIST")?.unwrap_or(false),
            only_music: parse_bool(&lookup, "ONLY_MUSIC")?.unwrap_or(false),
            compatibility_level,
            download_dir,
            downloader_path,
        })
    }

    pub fn quality_name(&self) -> &'static str {
        self.quality.display_name()
    }

    /// Multi-line summary of the settings that shape downloads.
    pub fn settings_summary(&self) -> String {
        format!(
            "Quality: {}\nSkip existing: {}\nLyrics: {}\nCover: {}",
            self.quality_name(),
            yes_no(self.skip_existing),
            self.lyrics_format,
            yes_no(self.embed_cover),
        )
    }
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "Yes"
    } else {
        "No"
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_user_ids(raw: &str) -> Result<BTreeSet<i64>> {
    raw.split(',')
        .map(|s| s.trim())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                Error::Config(format!("ALLOWED_USER_IDS contains a non-integer: {s:?}"))
            })
        })
        .collect()
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::Config(format!(
            "{key} must be a boolean, got {raw:?}"
        ))),
    }
}

fn parse_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<f64>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(Error::Config(format!("{key} must be a number, got {raw:?}"))),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("TELEGRAM_TOKEN".to_string(), "tg".to_string()),
            ("YANDEX_MUSIC_TOKEN".to_string(), "ym".to_string()),
            ("ALLOWED_USER_IDS".to_string(), "42".to_string()),
        ]);
        for (k, v) in pairs {
            vars.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.telegram_token, "tg");
        assert_eq!(cfg.yandex_music_token, "ym");
        assert_eq!(cfg.quality, Quality::Lossless);
        assert!(cfg.skip_existing);
        assert_eq!(cfg.lyrics_format, LyricsFormat::Text);
        assert!(cfg.embed_cover);
        assert_eq!(cfg.cover_resolution, CoverResolution::Original);
        assert_eq!(cfg.delay, 0.0);
        assert!(!cfg.stick_to_artist);
        assert!(!cfg.only_music);
        assert_eq!(cfg.compatibility_level, 1.0);
        assert_eq!(cfg.download_dir, PathBuf::from("./downloads"));
        assert_eq!(
            cfg.downloader_path,
            PathBuf::from("yandex-music-downloader")
        );
    }

    #[test]
    fn user_ids_are_split_and_trimmed() {
        let cfg = load(&[("ALLOWED_USER_IDS", "1, 2,3")]).unwrap();
        assert_eq!(cfg.allowed_user_ids, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn user_ids_reject_non_integers() {
        let err = load(&[("ALLOWED_USER_IDS", "1,abc")]).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("abc")));
        assert!(load(&[("ALLOWED_USER_IDS", "1,")]).is_err());
    }

    #[test]
    fn required_keys_must_be_present() {
        let vars: HashMap<&str, &str> = HashMap::from([("TELEGRAM_TOKEN", "tg")]);
        let err = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("YANDEX_MUSIC_TOKEN")));

        assert!(load(&[("TELEGRAM_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn cover_resolution_is_normalized() {
        let cfg = load(&[("COVER_RESOLUTION", "Original")]).unwrap();
        assert_eq!(cfg.cover_resolution, CoverResolution::Original);
        assert_eq!(cfg.cover_resolution.to_string(), "original");

        let cfg = load(&[("COVER_RESOLUTION", "400")]).unwrap();
        assert_eq!(cfg.cover_resolution, CoverResolution::Pixels("400".to_string()));
        assert_eq!(cfg.cover_resolution.to_string(), "400");
    }

    #[test]
    fn cover_resolution_has_no_upper_bound() {
        let huge = "99999999999999999999";
        let cfg = load(&[("COVER_RESOLUTION", huge)]).unwrap();
        assert_eq!(cfg.cover_resolution, CoverResolution::Pixels(huge.to_string()));
        assert_eq!(cfg.cover_resolution.to_string(), huge);
    }

    #[test]
    fn cover_resolution_rejects_other_text() {
        for bad in ["abc", "", "-1", "4 00", "1.5"] {
            let err = load(&[("COVER_RESOLUTION", bad)]).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn quality_is_a_closed_set() {
        assert_eq!(load(&[("QUALITY", "0")]).unwrap().quality, Quality::Low);
        assert_eq!(load(&[("QUALITY", "1")]).unwrap().quality, Quality::Medium);
        assert!(load(&[("QUALITY", "3")]).is_err());
        assert!(load(&[("QUALITY", "best")]).is_err());
    }

    #[test]
    fn lyrics_format_is_a_closed_set() {
        assert_eq!(
            load(&[("LYRICS_FORMAT", "lrc")]).unwrap().lyrics_format,
            LyricsFormat::Lrc
        );
        assert_eq!(
            load(&[("LYRICS_FORMAT", "none")]).unwrap().lyrics_format,
            LyricsFormat::None
        );
        assert!(load(&[("LYRICS_FORMAT", "synced")]).is_err());
    }

    #[test]
    fn booleans_and_numbers_are_validated() {
        let cfg = load(&[
            ("SKIP_EXISTING", "false"),
            ("EMBED_COVER", "0"),
            ("STICK_TO_ARTIST", "Yes"),
            ("ONLY_MUSIC", "on"),
            ("DELAY", "1.5"),
            ("COMPATIBILITY_LEVEL", "2"),
        ])
        .unwrap();
        assert!(!cfg.skip_existing);
        assert!(!cfg.embed_cover);
        assert!(cfg.stick_to_artist);
        assert!(cfg.only_music);
        assert_eq!(cfg.delay, 1.5);
        assert_eq!(cfg.compatibility_level, 2.0);

        assert!(load(&[("EMBED_COVER", "maybe")]).is_err());
        assert!(load(&[("DELAY", "-1")]).is_err());
        assert!(load(&[("DELAY", "soon")]).is_err());
        assert!(load(&[("COMPATIBILITY_LEVEL", "NaN")]).is_err());
    }

    #[test]
    fn settings_summary_lists_effective_values() {
        let cfg = load(&[("QUALITY", "1"), ("SKIP_EXISTING", "no")]).unwrap();
        let summary = cfg.settings_summary();
        assert!(summary.contains("Quality: Optimal (AAC 192kbps)"));
        assert!(summary.contains("Skip existing: No"));
        assert!(summary.contains("Lyrics: text"));
        assert!(summary.contains("Cover: Yes"));
    }
}

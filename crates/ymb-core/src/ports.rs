use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    config::{Config, LyricsFormat, Quality},
    Result,
};

/// Parameters for one download call.
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub quality: Quality,
    pub lyrics_format: LyricsFormat,
    pub embed_cover: bool,
}

impl DownloadRequest {
    pub fn from_config(url: &str, cfg: &Config) -> Self {
        Self {
            url: url.to_string(),
            output_dir: cfg.download_dir.clone(),
            quality: cfg.quality,
            lyrics_format: cfg.lyrics_format,
            embed_cover: cfg.embed_cover,
        }
    }
}

/// Port for the component that actually fetches, encodes and tags audio.
///
/// Implementations either return the complete result or fail; callers never see
/// partial albums.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download a single track and return the path of the audio file.
    async fn download_track(&self, req: &DownloadRequest) -> Result<PathBuf>;

    /// Download a whole album and return its audio files in track order.
    async fn download_album(&self, req: &DownloadRequest) -> Result<Vec<PathBuf>>;
}

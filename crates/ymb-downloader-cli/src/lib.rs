//! Downloader adapter for the `yandex-music-downloader` CLI.
//!
//! Each request runs the CLI once into a staging directory named after the
//! track or album id (`track-<id>`, `album-<id>`) under the configured download
//! dir. The audio files found there afterwards are the result, so a repeated
//! link reuses what is on disk and `--skip-existing` can take effect.

use async_trait::async_trait;

use std::{
    cmp::Ordering,
    collections::{HashMap, VecDeque},
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{Arc, Mutex as StdMutex},
};

use ymb_core::{
    config::{Config, CoverResolution},
    errors::Error,
    links,
    ports::{DownloadRequest, Downloader},
    Result,
};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::Mutex,
};
use walkdir::WalkDir;

const STDERR_TAIL_MAX_BYTES: usize = 16 * 1024;
const STDERR_TAIL_MAX_LINES: usize = 200;

const AUDIO_EXTENSIONS: &[&str] = &["flac", "mp3", "m4a", "aac", "ogg", "opus"];

/// Settings passed to every CLI invocation, on top of the per-request ones.
#[derive(Clone, Debug)]
pub struct DownloaderCliConfig {
    pub program: PathBuf,
    pub token: String,
    pub skip_existing: bool,
    pub cover_resolution: CoverResolution,
    pub delay: f64,
    pub stick_to_artist: bool,
    pub only_music: bool,
    pub compatibility_level: f64,
}

impl DownloaderCliConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            program: cfg.downloader_path.clone(),
            token: cfg.yandex_music_token.clone(),
            skip_existing: cfg.skip_existing,
            cover_resolution: cfg.cover_resolution.clone(),
            delay: cfg.delay,
            stick_to_artist: cfg.stick_to_artist,
            only_music: cfg.only_music,
            compatibility_level: cfg.compatibility_level,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Track,
    Album,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Track => "track",
            Kind::Album => "album",
        }
    }

    fn id_of(self, url: &str) -> Option<String> {
        match self {
            Kind::Track => links::track_id(url),
            Kind::Album => links::album_id(url),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
    bytes: usize,
}

impl StderrTail {
    fn push_line(&mut self, line: String) {
        // +1 for the '\n' we join with later.
        self.bytes = self.bytes.saturating_add(line.len() + 1);
        self.lines.push_back(line);

        while self.lines.len() > STDERR_TAIL_MAX_LINES || self.bytes > STDERR_TAIL_MAX_BYTES {
            if let Some(front) = self.lines.pop_front() {
                self.bytes = self.bytes.saturating_sub(front.len() + 1);
            } else {
                break;
            }
        }
    }

    fn snapshot(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

#[derive(Debug)]
pub struct CliDownloader {
    cfg: DownloaderCliConfig,
    // One lock per staging dir: two chats sending the same link run one after the other.
    dir_locks: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl CliDownloader {
    pub fn new(cfg: DownloaderCliConfig) -> Self {
        Self {
            cfg,
            dir_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn staging_dir(output_dir: &Path, kind: Kind, url: &str) -> PathBuf {
        let key = kind.id_of(url).unwrap_or_else(|| slug(url));
        output_dir.join(format!("{}-{key}", kind.as_str()))
    }

    fn dir_lock(&self, dir: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .dir_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(dir.to_path_buf()).or_default().clone()
    }

    fn build_args(&self, req: &DownloadRequest, dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--token".into(),
            self.cfg.token.clone().into(),
            "--url".into(),
            req.url.clone().into(),
            "--dir".into(),
            dir.as_os_str().to_os_string(),
            "--quality".into(),
            req.quality.level().to_string().into(),
            "--lyrics-format".into(),
            req.lyrics_format.as_str().into(),
            "--cover-resolution".into(),
            self.cfg.cover_resolution.to_string().into(),
            "--delay".into(),
            self.cfg.delay.to_string().into(),
            "--compatibility-level".into(),
            self.cfg.compatibility_level.to_string().into(),
        ];

        let flags = [
            (req.embed_cover, "--embed-cover"),
            (self.cfg.skip_existing, "--skip-existing"),
            (self.cfg.stick_to_artist, "--stick-to-artist"),
            (self.cfg.only_music, "--only-music"),
        ];
        for (enabled, flag) in flags {
            if enabled {
                args.push(flag.into());
            }
        }
        args
    }

    async fn run(&self, req: &DownloadRequest, kind: Kind) -> Result<Vec<PathBuf>> {
        let dir = Self::staging_dir(&req.output_dir, kind, &req.url);
        let lock = self.dir_lock(&dir);
        let _guard = lock.lock().await;
        tokio::fs::create_dir_all(&dir).await?;

        tracing::info!(
            kind = kind.as_str(),
            dir = %dir.display(),
            "running downloader for {}",
            req.url
        );

        let mut child = Command::new(&self.cfg.program)
            .args(self.build_args(req, &dir))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Download(format!(
                    "failed to start {}: {e}",
                    self.cfg.program.display()
                ))
            })?;

        // Drain stderr in background to avoid blocking on a full pipe.
        let stderr_tail: Arc<Mutex<StderrTail>> = Arc::new(Mutex::new(StderrTail::default()));
        let drain = child.stderr.take().map(|stderr| {
            let tail = stderr_tail.clone();
            tokio::spawn(async move {
                let mut r = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = r.next_line().await {
                    tail.lock().await.push_line(line);
                }
            })
        });

        let status = child.wait().await?;
        if let Some(drain) = drain {
            let _ = drain.await;
        }
        tracing::debug!(%status, "downloader exited");

        if !status.success() {
            let stderr = stderr_tail.lock().await.snapshot();
            let program = self.cfg.program.display();
            if stderr.trim().is_empty() {
                return Err(Error::Download(format!("{program} exited with status {status}")));
            }
            return Err(Error::Download(format!(
                "{program} exited with status {status}\n{stderr}"
            )));
        }

        let files = collect_audio_files(&dir);
        if files.is_empty() {
            return Err(Error::Download(format!(
                "no audio files were produced for {}",
                req.url
            )));
        }
        Ok(files)
    }
}

#[async_trait]
impl Downloader for CliDownloader {
    async fn download_track(&self, req: &DownloadRequest) -> Result<PathBuf> {
        let mut files = self.run(req, Kind::Track).await?;
        Ok(files.swap_remove(0))
    }

    async fn download_album(&self, req: &DownloadRequest) -> Result<Vec<PathBuf>> {
        self.run(req, Kind::Album).await
    }
}

/// Filesystem-safe stand-in for a link with no recognizable id.
fn slug(url: &str) -> String {
    let s: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    s.trim_matches('_').to_string()
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// All audio files below `dir`, in natural path order.
fn collect_audio_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_audio_file(p))
        .collect();
    files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    files
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut in_digits: Option<bool> = None;
    for (i, ch) in s.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        out.push(make_chunk(&s[start..], digit));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(s)
    } else {
        Chunk::Text(s)
    }
}

/// Compare strings so that digit runs order numerically ("2 - a" < "10 - b").
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => {
                let (xt, yt) = (x.trim_start_matches('0'), y.trim_start_matches('0'));
                xt.len()
                    .cmp(&yt.len())
                    .then_with(|| xt.cmp(yt))
                    .then_with(|| x.len().cmp(&y.len()))
            }
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len())
}

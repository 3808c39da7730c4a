use std::sync::Arc;

use ymb_core::{config::Config, ports::Downloader};
use ymb_downloader_cli::{CliDownloader, DownloaderCliConfig};

#[tokio::main]
async fn main() -> Result<(), ymb_core::Error> {
    ymb_core::logging::init("ymb")?;

    let cfg = Arc::new(Config::load()?);

    // Staging area for the downloader; must exist before the first request.
    std::fs::create_dir_all(&cfg.download_dir)?;

    let downloader: Arc<dyn Downloader> =
        Arc::new(CliDownloader::new(DownloaderCliConfig::from_config(&cfg)));

    ymb_telegram::router::run_polling(cfg, downloader)
        .await
        .map_err(|e| ymb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}

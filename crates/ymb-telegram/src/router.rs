use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use ymb_core::{
    config::Config,
    handler::DownloadHandler,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottledMessenger, DEFAULT_CHAT_INTERVAL},
    },
    ports::Downloader,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub downloads: Arc<DownloadHandler>,
}

pub async fn run_polling(cfg: Arc<Config>, downloader: Arc<dyn Downloader>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => tracing::info!("bot started: @{}", me.username()),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }
    tracing::info!("Download directory: {}", cfg.download_dir.display());
    tracing::info!("Allowed users: {}", cfg.allowed_user_ids.len());

    // Pace outbound calls so album uploads stay under Telegram's per-chat limits.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> =
        Arc::new(ThrottledMessenger::new(raw_messenger, DEFAULT_CHAT_INTERVAL));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        messenger: messenger.clone(),
        downloads: Arc::new(DownloadHandler::new(cfg, downloader, messenger)),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

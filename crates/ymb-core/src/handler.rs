//! Download handler: authorize → validate → classify → download → reply.

use std::{path::PathBuf, sync::Arc};

use crate::{
    config::Config,
    domain::ChatId,
    errors::RequestError,
    formatting::shorten_middle,
    links::{classify, is_supported_link, ContentType},
    messaging::{port::MessagingPort, types::TextMessage},
    ports::{DownloadRequest, Downloader},
    security::authorize,
};

/// Terminal state of one handled message.
#[derive(Debug)]
pub enum Outcome {
    /// Files were delivered.
    Replied,
    /// The request failed. The error reply, if the error has one, was sent;
    /// `AuthorizationDenied` gets none.
    Failed(RequestError),
}

pub struct DownloadHandler {
    cfg: Arc<Config>,
    downloader: Arc<dyn Downloader>,
    messenger: Arc<dyn MessagingPort>,
}

impl DownloadHandler {
    pub fn new(
        cfg: Arc<Config>,
        downloader: Arc<dyn Downloader>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            cfg,
            downloader,
            messenger,
        }
    }

    pub async fn handle_text(&self, msg: &TextMessage) -> Outcome {
        if !authorize(msg.user_id, &self.cfg.allowed_user_ids) {
            return Outcome::Failed(RequestError::AuthorizationDenied(msg.user_id));
        }

        let url = msg.text.trim();
        if !is_supported_link(url) {
            return self.fail(msg.chat_id, RequestError::InvalidLink).await;
        }

        let content_type = classify(url);
        tracing::info!(
            chat_id = msg.chat_id.0,
            user = msg.username.as_deref().unwrap_or("unknown"),
            %content_type,
            "download requested: {url}"
        );

        let result = match content_type {
            ContentType::Track => self.deliver_track(msg.chat_id, url).await,
            ContentType::Album => self.deliver_album(msg.chat_id, url).await,
            ContentType::Unknown => {
                return self
                    .fail(msg.chat_id, RequestError::UnknownContentType)
                    .await;
            }
        };

        match result {
            Ok(()) => Outcome::Replied,
            Err(e) => {
                tracing::error!("Error processing URL {url}: {e}");
                self.fail(msg.chat_id, e).await
            }
        }
    }

    async fn deliver_track(&self, chat_id: ChatId, url: &str) -> Result<(), RequestError> {
        self.notify(chat_id, "Starting track download...").await;
        let req = DownloadRequest::from_config(url, &self.cfg);
        let path = self.downloader.download_track(&req).await?;
        self.notify(chat_id, "Download finished.").await;
        self.send_files(chat_id, &[path]).await
    }

    async fn deliver_album(&self, chat_id: ChatId, url: &str) -> Result<(), RequestError> {
        self.notify(chat_id, "Starting album download...").await;
        let req = DownloadRequest::from_config(url, &self.cfg);
        let paths = self.downloader.download_album(&req).await?;
        self.notify(
            chat_id,
            &format!("Finished downloading {} tracks.", paths.len()),
        )
        .await;
        self.send_files(chat_id, &paths).await
    }

    // Stops at the first failed upload; the remaining files are not sent.
    async fn send_files(&self, chat_id: ChatId, paths: &[PathBuf]) -> Result<(), RequestError> {
        for path in paths {
            self.messenger.send_audio(chat_id, path).await?;
        }
        Ok(())
    }

    async fn notify(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            tracing::warn!(chat_id = chat_id.0, "failed to send notice: {e}");
        }
    }

    // The full error has already been logged; the reply only has to fit.
    async fn fail(&self, chat_id: ChatId, err: RequestError) -> Outcome {
        if let Some(text) = err.user_message() {
            let max = self.messenger.capabilities().max_message_len;
            self.notify(chat_id, &shorten_middle(&text, max)).await;
        }
        Outcome::Failed(err)
    }
}

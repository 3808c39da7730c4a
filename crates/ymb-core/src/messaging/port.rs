use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::MessagingCapabilities,
    Result,
};

/// Outbound side of the chat transport.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Upload a local audio file. The file is opened for the duration of the
    /// upload only; a missing or unreadable file is an `Error::Io`.
    async fn send_audio(&self, chat_id: ChatId, path: &Path) -> Result<MessageRef>;
}

use crate::domain::{ChatId, UserId};

/// Incoming plain-text message, the unit of work for the download handler.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    /// `None` when the transport could not attribute the message to a user.
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub text: String,
}

/// Limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Longest text message the transport accepts, in chars.
    pub max_message_len: usize,
}

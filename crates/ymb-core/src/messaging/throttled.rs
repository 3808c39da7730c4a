//! Per-chat pacing of outbound messages.
//!
//! An album turns into a notice plus one upload per track, all aimed at the same
//! chat. Telegram starts answering `429 Too Many Requests` when a chat receives
//! more than about one message per second, so every send first books a slot.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{port::MessagingPort, types::MessagingCapabilities},
    Result,
};

/// Gap between two sends into the same chat.
pub const DEFAULT_CHAT_INTERVAL: Duration = Duration::from_millis(1050);

/// Next free send time of every chat with sends still in flight.
#[derive(Debug)]
struct ChatSlots {
    gap: Duration,
    next_free: HashMap<ChatId, Instant>,
}

impl ChatSlots {
    fn new(gap: Duration) -> Self {
        Self {
            gap,
            next_free: HashMap::new(),
        }
    }

    /// Take the earliest free slot for `chat`; returns how long to wait for it.
    fn book(&mut self, chat: ChatId, now: Instant) -> Duration {
        // Chats that have been idle for a full gap need no entry.
        self.next_free.retain(|_, free| *free > now);

        let slot = self.next_free.get(&chat).map_or(now, |free| (*free).max(now));
        self.next_free.insert(chat, slot + self.gap);
        slot - now
    }
}

/// `MessagingPort` decorator that spaces sends to the same chat by a fixed gap.
/// Different chats do not wait on each other.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    slots: Mutex<ChatSlots>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, chat_interval: Duration) -> Self {
        Self {
            inner,
            slots: Mutex::new(ChatSlots::new(chat_interval)),
        }
    }

    async fn wait_turn(&self, chat: ChatId) {
        let wait = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slots.book(chat, Instant::now())
        };
        if !wait.is_zero() {
            tracing::trace!(chat_id = chat.0, ?wait, "pacing send");
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_text(chat_id, text).await
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn send_audio(&self, chat_id: ChatId, path: &Path) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_audio(chat_id, path).await
    }
}

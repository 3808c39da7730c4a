//! Telegram update handlers.
//!
//! Commands (`/start`, `/help`) are answered here; every other text message is
//! handed to the core download handler.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Message, MessageEntity, MessageEntityKind},
};

use crate::router::AppState;

mod commands;
mod text;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.text().is_none() {
        // Only text is meaningful to this bot.
        return Ok(());
    }

    if starts_with_command(msg.entities().unwrap_or_default()) {
        return commands::handle_command(bot, msg, state).await;
    }

    text::handle_text(msg, state).await
}

/// A message is a command when Telegram marked a `bot_command` entity at its
/// very start. Text that merely begins with `/` is not.
fn starts_with_command(entities: &[MessageEntity]) -> bool {
    entities
        .iter()
        .any(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_leading_bot_command_entity_counts() {
        let command = MessageEntity::new(MessageEntityKind::BotCommand, 0, 6);
        assert!(starts_with_command(&[command.clone()]));

        // "see /help": a command, but not at the start.
        let later = MessageEntity::new(MessageEntityKind::BotCommand, 4, 5);
        assert!(!starts_with_command(&[later]));

        // "/music.yandex.ru/album/1" has no command entity at all.
        assert!(!starts_with_command(&[]));
        let url = MessageEntity::new(MessageEntityKind::Url, 0, 24);
        assert!(!starts_with_command(&[url.clone()]));
        assert!(starts_with_command(&[url, command]));
    }
}

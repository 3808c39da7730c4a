use std::sync::Arc;

use teloxide::prelude::*;

use ymb_core::{
    config::Config,
    domain::{ChatId, UserId},
    formatting::{escape_html, mention_html},
    security::authorize,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn start_message(cfg: &Config, user_id: UserId, display_name: &str) -> String {
    format!(
        "Hi {}! I download music from Yandex Music.\n\
Just send me a link to a track or an album.\n\n\
<b>Current settings:</b>\n{}",
        mention_html(user_id, display_name),
        escape_html(&cfg.settings_summary()),
    )
}

fn help_message() -> &'static str {
    "Send me a link to:\n\
- a track (e.g. https://music.yandex.ru/album/12345/track/54321)\n\
- an album (e.g. https://music.yandex.ru/album/12345)\n\n\
All download options are configured through environment variables."
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user = msg.from();
    let user_id = user.map(|u| UserId(u.id.0 as i64));

    if !authorize(user_id, &state.cfg.allowed_user_ids) {
        return Ok(());
    }
    let Some(user) = user else {
        return Ok(());
    };
    let user_id = UserId(user.id.0 as i64);
    let chat_id = ChatId(msg.chat.id.0);

    let (cmd, _arg) = parse_command(text);

    let sent = match cmd.as_str() {
        "start" => {
            let body = start_message(&state.cfg, user_id, &user.full_name());
            state.messenger.send_html(chat_id, &body).await
        }
        "help" => state.messenger.send_text(chat_id, help_message()).await,
        // Other commands are not part of this bot's surface.
        _ => return Ok(()),
    };

    if let Err(e) = sent {
        tracing::warn!(chat_id = chat_id.0, "failed to answer /{cmd}: {e}");
    }
    Ok(())
}

use std::sync::Arc;

use teloxide::prelude::*;

use ymb_core::{
    domain::{ChatId, UserId},
    errors::RequestError,
    handler::Outcome,
    messaging::types::TextMessage,
};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user = msg.from();
    let incoming = TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: user.map(|u| UserId(u.id.0 as i64)),
        username: user.and_then(|u| u.username.clone()),
        text: text.to_string(),
    };

    match state.downloads.handle_text(&incoming).await {
        Outcome::Replied | Outcome::Failed(RequestError::AuthorizationDenied(_)) => {}
        Outcome::Failed(e) => {
            tracing::debug!(chat_id = incoming.chat_id.0, "request failed: {e}");
        }
    }

    Ok(())
}

//! Telegram HTML helpers.

use crate::domain::UserId;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inline mention that links to the user's profile.
pub fn mention_html(user_id: UserId, display_name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id.0,
        escape_html(display_name)
    )
}

/// Shorten `text` to at most `max` chars by cutting out its middle.
///
/// The head and the tail are kept around a `...` line, since error output
/// (tracebacks in particular) puts the actual cause at the end.
pub fn shorten_middle(text: &str, max: usize) -> String {
    const GAP: &str = "\n...\n";

    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    let gap = GAP.chars().count();
    if max <= gap {
        return text.chars().take(max).collect();
    }

    let keep = max - gap;
    let head = keep / 2;
    let tail = keep - head;
    let mut out: String = text.chars().take(head).collect();
    out.push_str(GAP);
    out.extend(text.chars().skip(len - tail));
    out
}

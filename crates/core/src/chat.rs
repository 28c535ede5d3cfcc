//! Chat inbox conventions: collection paths, senders, message rules.

use crate::error::CoreError;

/// Collection holding one thread document per user (document id = user id).
pub const THREADS_COLLECTION: &str = "chats";

/// Name of the per-thread message subcollection.
pub const MESSAGES_SUBCOLLECTION: &str = "messages";

pub const SENDER_ADMIN: &str = "admin";
pub const SENDER_USER: &str = "user";

/// Maximum message length in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Maximum length of the denormalised `last_message` preview.
pub const PREVIEW_CHARS: usize = 100;

/// Collection path of a user's message subcollection: `chats/{uid}/messages`.
pub fn messages_path(user_id: &str) -> String {
    format!("{THREADS_COLLECTION}/{user_id}/{MESSAGES_SUBCOLLECTION}")
}

/// Validate and normalise an outgoing message body.
pub fn validate_message_text(text: &str) -> Result<String, CoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Message must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(CoreError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Preview text stored on the thread summary, truncated on a char boundary.
pub fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(PREVIEW_CHARS - 1).collect();
    out.push('…');
    out
}

/// Validate a thread id before it is spliced into a collection path.
pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if user_id.is_empty() || user_id.contains('/') {
        return Err(CoreError::Validation(format!(
            "Invalid chat user id '{user_id}'"
        )));
    }
    Ok(())
}

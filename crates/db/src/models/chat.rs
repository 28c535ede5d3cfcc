//! Chat inbox documents.
//!
//! Threads live in `chats` keyed by user id; messages live in the
//! `chats/{uid}/messages` subcollection. Neither goes through the generic
//! CRUD screens.

use atelier_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Denormalised summary of a user's conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatThread {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub last_sender: Option<String>,
    /// Messages from the user not yet read by an admin.
    pub unread_count: u32,
}

/// One message in a thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    pub text: String,
    /// `admin` or `user`.
    pub sender: String,
    pub sender_name: Option<String>,
}

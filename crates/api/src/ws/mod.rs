//! WebSocket infrastructure for the live chat inbox.
//!
//! Provides connection management, heartbeat monitoring, and the chat
//! subscription upgrade handler.

mod chat;
mod heartbeat;
pub mod manager;

pub use chat::{change_frame, chat_subscribe, ChatFrame};
pub use heartbeat::start_heartbeat;
pub use manager::{WsManager, WsOwner};

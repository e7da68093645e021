//! Message module - Conversation entries
//!
//! Shared message types used by the client, the session core and front-ends.

mod chat_message;

pub use chat_message::{ChatMessage, MessageFile, MessageId, Sender};

//! livechat_session - Client-side session core of the live chat
//!
//! `SessionCore` owns the conversation: it registers the visitor, sends
//! messages and files with optimistic updates, polls history while a live
//! agent is answering and keeps the user and session records in a
//! `LocalStore` so a restart can resume.

pub mod error;
mod manager;
pub mod persistence;
mod polling;
mod state;
pub mod storage;

pub use error::{LiveChatError, Result};
pub use manager::SessionCore;
pub use persistence::SessionPersistence;
pub use state::ChatSnapshot;
pub use storage::{FileLocalStore, LocalStore, MemoryLocalStore};

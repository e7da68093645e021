//! livechat_core - Core types for the live-chat client
//!
//! This crate provides the foundational types shared by the other livechat crates:
//! - `message` - ChatMessage, Sender and message identifiers
//! - `session` - User, registration data, quick-reply options and input kinds
//! - `upload` - File attachments and their validation rules
//! - `wire` - Response shapes of the remote chat service
//! - `config` - Client configuration loading

pub mod config;
pub mod error;
pub mod message;
pub mod paths;
pub mod session;
pub mod upload;
pub mod widget;
pub mod wire;

// Re-export commonly used types
pub use config::LiveChatConfig;
pub use error::{ConfigFileError, ValidationError};
pub use message::{ChatMessage, MessageFile, MessageId, Sender};
pub use session::{ChatMode, ChatOption, InputType, PersistedSession, RegistrationData, User};
pub use upload::{FileUpload, ALLOWED_CONTENT_TYPES, MAX_UPLOAD_BYTES};
pub use widget::WidgetConfig;

pub mod api;
pub mod client_trait;
pub mod error;

pub use api::client::LiveChatClient;
pub use client_trait::ChatService;
pub use error::{ClientError, Result};
pub use livechat_core::LiveChatConfig;

use async_trait::async_trait;
use livechat_core::wire::{ConfigResponse, HistoryResponse, InitResponse, SendResponse};
use livechat_core::{FileUpload, RegistrationData};

use crate::error::Result;

/// The five request-style operations of the remote chat service.
///
/// `LiveChatClient` implements this over HTTP; tests substitute in-memory
/// fakes.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Whether the service has the endpoint and token it needs. Callers
    /// check this before issuing any request.
    fn is_configured(&self) -> bool {
        true
    }

    async fn get_config(&self) -> Result<ConfigResponse>;

    async fn init_session(&self, registration: &RegistrationData) -> Result<InitResponse>;

    async fn send_message(
        &self,
        external_user_id: i64,
        message: &str,
        object: Option<&serde_json::Value>,
    ) -> Result<SendResponse>;

    async fn send_file(
        &self,
        external_user_id: i64,
        file: &FileUpload,
        message: Option<&str>,
    ) -> Result<SendResponse>;

    async fn get_history(&self, external_user_id: i64) -> Result<HistoryResponse>;
}

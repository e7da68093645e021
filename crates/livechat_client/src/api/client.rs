use std::time::Duration;

use async_trait::async_trait;
use livechat_core::wire::{
    ConfigResponse, HistoryResponse, InitResponse, SendMessageRequest, SendResponse,
};
use livechat_core::{FileUpload, LiveChatConfig, RegistrationData};
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::api::response::read_json;
use crate::client_trait::ChatService;
use crate::error::{ClientError, Result};

pub const TOKEN_HEADER: &str = "X-LiveChat-Token";

/// HTTP implementation of [`ChatService`].
///
/// Reads (config, history) go through a retrying client. Writes are sent
/// exactly once: a retried message send could post the same text twice.
#[derive(Debug, Clone)]
pub struct LiveChatClient {
    base_url: String,
    token: String,
    client: Client,
    read_client: ClientWithMiddleware,
}

impl LiveChatClient {
    pub fn new(config: &LiveChatConfig) -> Result<Self> {
        let client = Self::build_http_client(config)?;
        let read_client = Self::build_retry_client(client.clone(), config.max_retries);

        Ok(Self {
            base_url: config.api_url.trim().trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
            client,
            read_client,
        })
    }

    fn build_http_client(config: &LiveChatConfig) -> Result<Client> {
        Client::builder()
            .default_headers(Self::default_headers(config.token.trim())?)
            .timeout(config.request_timeout())
            .build()
            .map_err(ClientError::Http)
    }

    fn build_retry_client(client: Client, max_retries: u32) -> ClientWithMiddleware {
        if max_retries == 0 {
            return ClientBuilder::new(client).build();
        }

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(200), Duration::from_secs(5))
            .build_with_max_retries(max_retries);

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    pub fn default_headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(token)
            .map_err(|e| ClientError::Config(format!("invalid token header: {e}")))?;
        headers.insert(TOKEN_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ClientError::Config("api url and token are required".to_string()))
        }
    }
}

#[async_trait]
impl ChatService for LiveChatClient {
    fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.token.is_empty()
    }

    async fn get_config(&self) -> Result<ConfigResponse> {
        self.ensure_configured()?;
        let url = self.url("/livechat/config");
        debug!("GET {}", url);
        let response = self.read_client.get(&url).send().await?;
        read_json(response).await
    }

    async fn init_session(&self, registration: &RegistrationData) -> Result<InitResponse> {
        self.ensure_configured()?;
        let url = self.url("/livechat/init");
        info!("Initializing chat session for {}", registration.name);
        let response = self.client.post(&url).json(registration).send().await?;
        read_json(response).await
    }

    async fn send_message(
        &self,
        external_user_id: i64,
        message: &str,
        object: Option<&serde_json::Value>,
    ) -> Result<SendResponse> {
        self.ensure_configured()?;
        let url = self.url("/livechat/message");
        let body = SendMessageRequest {
            external_user_id,
            message,
            object,
        };
        debug!("POST {} ({} chars)", url, message.len());
        let response = self.client.post(&url).json(&body).send().await?;
        read_json(response).await
    }

    async fn send_file(
        &self,
        external_user_id: i64,
        file: &FileUpload,
        message: Option<&str>,
    ) -> Result<SendResponse> {
        self.ensure_configured()?;
        let url = self.url("/livechat/message");

        let part = Part::bytes(file.data.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let mut form = Form::new()
            .text("external_user_id", external_user_id.to_string())
            .part("file", part);
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            form = form.text("message", message.to_string());
        }

        info!("Uploading {} ({} bytes)", file.name, file.size());
        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }

    async fn get_history(&self, external_user_id: i64) -> Result<HistoryResponse> {
        self.ensure_configured()?;
        let url = self.url(&format!("/livechat/history/{external_user_id}"));
        debug!("GET {}", url);
        let response = self.read_client.get(&url).send().await?;
        read_json(response).await
    }
}

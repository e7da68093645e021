//! Scripted in-memory chat service shared by the scenario tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use livechat_client::{ChatService, ClientError, Result};
use livechat_core::wire::{ConfigResponse, HistoryResponse, InitResponse, SendResponse};
use livechat_core::{FileUpload, LiveChatConfig, RegistrationData};
use livechat_session::{MemoryLocalStore, SessionCore};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

#[derive(Default)]
pub struct Calls {
    pub get_config: AtomicUsize,
    pub init_session: AtomicUsize,
    pub send_message: AtomicUsize,
    pub send_file: AtomicUsize,
    pub get_history: AtomicUsize,
}

impl Calls {
    pub fn network(&self) -> usize {
        self.get_config.load(Ordering::SeqCst)
            + self.init_session.load(Ordering::SeqCst)
            + self.send_message.load(Ordering::SeqCst)
            + self.send_file.load(Ordering::SeqCst)
            + self.get_history.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.send_message.load(Ordering::SeqCst) + self.send_file.load(Ordering::SeqCst)
    }
}

/// Fake service. Send responses are queued and consumed in order; history
/// is whatever was last set.
#[derive(Default)]
pub struct FakeChatService {
    pub calls: Calls,
    pub configured: Option<bool>,
    config: Mutex<Option<Result<ConfigResponse>>>,
    init: Mutex<Option<Result<InitResponse>>>,
    sends: Mutex<VecDeque<Result<SendResponse>>>,
    history: Mutex<Option<HistoryResponse>>,
    history_error: Mutex<Option<String>>,
    pub sent: Mutex<Vec<(i64, String, Option<Value>)>>,
    pub uploaded: Mutex<Vec<(i64, String)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeChatService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: Some(false),
            ..Self::default()
        }
    }

    pub fn with_user(self, id: i64, name: &str, phone: &str) -> Self {
        *self.init.lock() = Some(Ok(serde_json::from_value(json!({
            "user": { "id": id, "name": name, "phone": phone },
            "external_user_id": id
        }))
        .expect("init response")));
        self
    }

    pub fn fail_init(self, message: &str) -> Self {
        *self.init.lock() = Some(Err(ClientError::Api(message.to_string())));
        self
    }

    pub fn with_widget_config(self, value: Value) -> Self {
        *self.config.lock() = Some(Ok(serde_json::from_value(value).expect("config response")));
        self
    }

    pub fn fail_config(self, message: &str) -> Self {
        *self.config.lock() = Some(Err(ClientError::Api(message.to_string())));
        self
    }

    pub fn push_send(&self, value: Value) {
        self.sends
            .lock()
            .push_back(Ok(serde_json::from_value(value).expect("send response")));
    }

    pub fn push_send_error(&self, message: &str) {
        self.sends
            .lock()
            .push_back(Err(ClientError::Api(message.to_string())));
    }

    pub fn set_history(&self, value: Value) {
        *self.history.lock() = Some(serde_json::from_value(value).expect("history response"));
        *self.history_error.lock() = None;
    }

    pub fn fail_history(&self, message: &str) {
        *self.history_error.lock() = Some(message.to_string());
    }

    /// Hold `init_session` and send calls until the returned gate is notified.
    pub fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ChatService for FakeChatService {
    fn is_configured(&self) -> bool {
        self.configured.unwrap_or(true)
    }

    async fn get_config(&self) -> Result<ConfigResponse> {
        self.calls.get_config.fetch_add(1, Ordering::SeqCst);
        match self.config.lock().as_ref() {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(err)) => Err(ClientError::Api(err.to_string())),
            None => Ok(ConfigResponse::default()),
        }
    }

    async fn init_session(&self, _registration: &RegistrationData) -> Result<InitResponse> {
        self.calls.init_session.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        match self.init.lock().as_ref() {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(err)) => Err(ClientError::Api(err.to_string())),
            None => Err(ClientError::Api("no init scripted".to_string())),
        }
    }

    async fn send_message(
        &self,
        external_user_id: i64,
        message: &str,
        object: Option<&Value>,
    ) -> Result<SendResponse> {
        self.calls.send_message.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .push((external_user_id, message.to_string(), object.cloned()));
        self.pass_gate().await;
        self.sends
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Api("no send scripted".to_string())))
    }

    async fn send_file(
        &self,
        external_user_id: i64,
        file: &FileUpload,
        _message: Option<&str>,
    ) -> Result<SendResponse> {
        self.calls.send_file.fetch_add(1, Ordering::SeqCst);
        self.uploaded.lock().push((external_user_id, file.name.clone()));
        self.sends
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Api("no send scripted".to_string())))
    }

    async fn get_history(&self, _external_user_id: i64) -> Result<HistoryResponse> {
        self.calls.get_history.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.history_error.lock().clone() {
            return Err(ClientError::Api(message));
        }
        Ok(self.history.lock().clone().unwrap_or_default())
    }
}

pub fn config() -> LiveChatConfig {
    LiveChatConfig::with_endpoint("https://chat.example.com", "abc")
}

pub fn core_with(service: &Arc<FakeChatService>, store: &MemoryLocalStore) -> SessionCore {
    SessionCore::new(&config(), service.clone(), Arc::new(store.clone()))
}

//! Session core - owns the conversation and keeps it in sync with the
//! remote service and the local store.

use std::sync::{Arc, Weak};
use std::time::Duration;

use livechat_client::{ChatService, LiveChatClient};
use livechat_core::wire::SendResponse;
use livechat_core::{ChatMessage, ChatOption, FileUpload, LiveChatConfig, RegistrationData};
use livechat_state::{ChatEvent, ChatPhase, PhaseTransition};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{LiveChatError, Result};
use crate::persistence::SessionPersistence;
use crate::polling::PollingSupervisor;
use crate::state::{ChatSnapshot, ChatState};
use crate::storage::{FileLocalStore, LocalStore};

struct Inner {
    remote: Arc<dyn ChatService>,
    persistence: SessionPersistence,
    state: RwLock<ChatState>,
    updates: watch::Sender<ChatSnapshot>,
    poll_interval: Duration,
}

impl Inner {
    /// Mutate the state and publish the resulting snapshot. The lock is
    /// released before subscribers are notified.
    fn update<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = f(&mut state);
            (result, state.snapshot())
        };
        self.updates.send_replace(snapshot);
        result
    }

    fn persist_session(&self, record: &livechat_core::PersistedSession) {
        if let Err(err) = self.persistence.save_session(record) {
            warn!("{}", err);
        }
    }
}

/// What a send carries to the service.
enum Outgoing<'a> {
    Text {
        text: &'a str,
        object: Option<&'a serde_json::Value>,
    },
    File {
        file: &'a FileUpload,
        message: Option<&'a str>,
    },
}

impl Outgoing<'_> {
    fn pending_message(&self) -> ChatMessage {
        match self {
            Self::Text { text, .. } => ChatMessage::pending_text(*text),
            Self::File { file, .. } => ChatMessage::pending_file(&file.name),
        }
    }
}

/// Client-side state of one embedded chat.
///
/// All operations may be called from any task. State is guarded by a lock
/// that is never held across a request; the requests themselves are the
/// only suspension points. Concurrent sends are not serialized, callers are
/// expected to wait while `is_loading` is set.
pub struct SessionCore {
    inner: Arc<Inner>,
    poller: Mutex<PollingSupervisor>,
}

impl SessionCore {
    pub fn new(
        config: &LiveChatConfig,
        remote: Arc<dyn ChatService>,
        store: Arc<dyn LocalStore>,
    ) -> Self {
        let state = ChatState::default();
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(Inner {
                remote,
                persistence: SessionPersistence::new(store, config),
                state: RwLock::new(state),
                updates,
                poll_interval: config.poll_interval(),
            }),
            poller: Mutex::new(PollingSupervisor::new()),
        }
    }

    /// Build a core over HTTP and the file store configured in `config`.
    pub fn from_config(config: &LiveChatConfig) -> Result<Self> {
        let remote = LiveChatClient::new(config)?;
        let store = FileLocalStore::new(config.storage_dir());
        Ok(Self::new(config, Arc::new(remote), Arc::new(store)))
    }

    // ========== Observation ==========

    pub fn snapshot(&self) -> ChatSnapshot {
        self.inner.state.read().snapshot()
    }

    /// Change feed: a new snapshot is published after every mutation,
    /// including those made by the polling task.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn phase(&self) -> ChatPhase {
        self.inner.state.read().phase()
    }

    /// Recent lifecycle transitions, oldest first.
    pub fn transitions(&self) -> Vec<PhaseTransition> {
        self.inner.state.read().transitions()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_running()
    }

    pub fn is_configured(&self) -> bool {
        self.inner.remote.is_configured()
    }

    // ========== Lifecycle ==========

    /// Mount the chat: restore saved state, fetch the widget configuration
    /// and, when a user was restored, the conversation history.
    pub async fn start(&self) {
        let restored = self.restore();
        // A failure is already surfaced through the error field.
        let _ = self.load_widget_config().await;
        if restored {
            self.hydrate_history().await;
        }
    }

    /// Adopt the user and session saved by a previous run. Does not contact
    /// the service. Returns whether a user was restored.
    pub fn restore(&self) -> bool {
        if self.phase() != ChatPhase::Uninitialized {
            debug!("restore skipped, chat already started");
            return false;
        }

        let user = match self.inner.persistence.load_user() {
            Ok(Some(user)) => user,
            Ok(None) => return false,
            Err(err) => {
                warn!("{}", err);
                return false;
            }
        };
        let session = self.inner.persistence.load_session().unwrap_or_else(|err| {
            warn!("{}", err);
            None
        });

        info!(user_id = user.id, "restored saved chat");
        self.update(|state| state.restore(user, session));
        true
    }

    /// Fetch the display configuration. A failure is shown as an error but
    /// does not block chatting.
    pub async fn load_widget_config(&self) -> Result<()> {
        if !self.is_configured() {
            return Err(LiveChatError::NotConfigured);
        }

        match self.inner.remote.get_config().await {
            Ok(response) => {
                self.update(|state| state.widget_config = response.config);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to load widget config: {}", err);
                let err = LiveChatError::from(err);
                self.update(|state| state.error = Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Load the saved conversation of the current user. Failures are only
    /// logged. Returns whether the state was replaced.
    pub async fn hydrate_history(&self) -> bool {
        let Some(user_id) = self.inner.state.read().user_id() else {
            return false;
        };
        if !self.is_configured() {
            return false;
        }
        self.hydrate(user_id, user_id).await
    }

    async fn hydrate(&self, owner_id: i64, history_id: i64) -> bool {
        let history = match self.inner.remote.get_history(history_id).await {
            Ok(history) => history,
            Err(err) => {
                warn!("Failed to load history: {}", err);
                return false;
            }
        };

        let record = self.update(|state| {
            if state.user_id() != Some(owner_id) {
                return None;
            }
            state
                .apply_history(&history)
                .then(|| state.session_record())
        });

        match record {
            Some(record) => {
                self.inner.persist_session(&record);
                true
            }
            None => false,
        }
    }

    /// Register the visitor and load any conversation the service already
    /// has for them.
    pub async fn init_session(&self, registration: RegistrationData) -> Result<()> {
        if !self.is_configured() {
            return Err(self.fail(LiveChatError::NotConfigured));
        }
        let registration = registration.validate().map_err(|e| self.fail(e.into()))?;

        self.update(|state| {
            state.is_loading = true;
            state.error = None;
            state.machine.handle_event(ChatEvent::RegistrationSubmitted);
        });

        let response = match self.inner.remote.init_session(&registration).await {
            Ok(response) => response,
            Err(err) => {
                let err = LiveChatError::from(err);
                self.update(|state| {
                    if state.machine.try_handle_event(ChatEvent::RegistrationFailed).is_ok() {
                        state.is_loading = false;
                        state.error = Some(err.clone());
                    }
                });
                return Err(err);
            }
        };

        // A reset while the request was in flight moves the phase away from
        // `Initializing`; the late response is then dropped.
        let user = response.user.clone();
        let applied = self.update(|state| {
            match state.machine.try_handle_event(ChatEvent::RegistrationConfirmed) {
                Ok(_) => {
                    state.user = Some(user);
                    true
                }
                Err(err) => {
                    debug!("discarding registration response: {}", err);
                    false
                }
            }
        });
        if !applied {
            return Ok(());
        }
        info!(user_id = response.user.id, "chat session initialized");
        if let Err(err) = self.inner.persistence.save_user(&response.user) {
            warn!("{}", err);
        }

        self.hydrate(response.user.id, response.history_user_id()).await;
        self.update(|state| state.is_loading = false);
        Ok(())
    }

    // ========== Sending ==========

    pub async fn send_message(&self, text: &str) -> Result<()> {
        self.dispatch(Outgoing::Text { text, object: None }).await
    }

    /// Send text along with a structured payload for the service.
    pub async fn send_message_with_object(
        &self,
        text: &str,
        object: &serde_json::Value,
    ) -> Result<()> {
        self.dispatch(Outgoing::Text {
            text,
            object: Some(object),
        })
        .await
    }

    /// Answer with a quick-reply option.
    pub async fn select_option(&self, option: &ChatOption) -> Result<()> {
        self.send_message(option.reply_text()).await
    }

    pub async fn send_file(&self, file: &FileUpload) -> Result<()> {
        self.send_file_with_message(file, None).await
    }

    pub async fn send_file_with_message(
        &self,
        file: &FileUpload,
        message: Option<&str>,
    ) -> Result<()> {
        self.dispatch(Outgoing::File { file, message }).await
    }

    async fn dispatch(&self, outgoing: Outgoing<'_>) -> Result<()> {
        let user_id = self.check_can_send()?;
        if let Outgoing::File { file, .. } = &outgoing {
            file.validate().map_err(|e| self.fail(e.into()))?;
        }

        let tentative = self.update(|state| {
            state.is_loading = true;
            state.error = None;
            state.append_tentative(outgoing.pending_message())
        });
        debug!(id = %tentative.id(), "sending message");

        let result: std::result::Result<SendResponse, _> = match outgoing {
            Outgoing::Text { text, object } => {
                self.inner.remote.send_message(user_id, text, object).await
            }
            Outgoing::File { file, message } => {
                self.inner.remote.send_file(user_id, file, message).await
            }
        };

        match result {
            Ok(response) => {
                let record = self.update(|state| {
                    state.is_loading = false;
                    // A reset while the request was in flight wins.
                    if state.user_id() != Some(user_id) {
                        let _ = tentative.rollback(state);
                        return None;
                    }
                    tentative.confirm(state, &response);
                    Some(state.session_record())
                });
                if let Some(record) = record {
                    self.inner.persist_session(&record);
                }
                Ok(())
            }
            Err(err) => {
                let err = LiveChatError::from(err);
                warn!("Failed to send message: {}", err);
                self.update(|state| {
                    state.is_loading = false;
                    let _ = tentative.rollback(state);
                    state.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }

    /// Preconditions shared by every send, checked in this order.
    fn check_can_send(&self) -> Result<i64> {
        if !self.is_configured() {
            return Err(self.fail(LiveChatError::NotConfigured));
        }
        let (user_id, phase) = {
            let state = self.inner.state.read();
            (state.user_id(), state.phase())
        };
        let Some(user_id) = user_id.filter(|_| phase.is_initialized()) else {
            return Err(self.fail(LiveChatError::NotInitialized));
        };
        if !phase.accepts_messages() {
            return Err(self.fail(LiveChatError::SessionEnded));
        }
        Ok(user_id)
    }

    // ========== Local actions ==========

    /// Forget the conversation and the saved user. No request is made.
    pub fn reset_chat(&self) {
        self.update(ChatState::reset);
        if let Err(err) = self.inner.persistence.clear() {
            warn!("{}", err);
        }
        info!("chat reset");
    }

    pub fn dismiss_error(&self) {
        self.update(|state| state.error = None);
    }

    /// Surface `err` in the error field and hand it back.
    fn fail(&self, err: LiveChatError) -> LiveChatError {
        self.update(|state| state.error = Some(err.clone()));
        err
    }

    fn update<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> R {
        let result = self.inner.update(f);
        self.sync_polling();
        result
    }

    fn sync_polling(&self) {
        let key = self.inner.state.read().polling_key();
        let inner = Arc::downgrade(&self.inner);
        let period = self.inner.poll_interval;
        self.poller
            .lock()
            .sync(key, move |user_id, cancel| poll_history(inner, user_id, period, cancel));
    }
}

/// Re-fetch the history of `user_id` every `period` until cancelled.
async fn poll_history(
    inner: Weak<Inner>,
    user_id: i64,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = inner.upgrade() else {
            break;
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = inner.remote.get_history(user_id) => result,
        };

        match result {
            Ok(history) => {
                inner.update(|state| {
                    // Settled after teardown or after the key moved on.
                    if cancel.is_cancelled() || state.polling_key() != Some(user_id) {
                        return;
                    }
                    if state.apply_poll(history) {
                        debug!(user_id, count = state.messages.len(), "polled history");
                    }
                });
            }
            Err(err) => {
                warn!("{}", LiveChatError::Polling(err.to_string()));
            }
        }
    }

    debug!(user_id, "polling loop exited");
}

use std::sync::Arc;

use livechat_core::{LiveChatConfig, PersistedSession, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{LiveChatError, Result};
use crate::storage::LocalStore;

/// Reads and writes the user and session records of one deployment token.
#[derive(Clone)]
pub struct SessionPersistence {
    store: Arc<dyn LocalStore>,
    user_key: String,
    session_key: String,
}

impl SessionPersistence {
    pub fn new(store: Arc<dyn LocalStore>, config: &LiveChatConfig) -> Self {
        Self {
            store,
            user_key: config.user_key(),
            session_key: config.session_key(),
        }
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn load_user(&self) -> Result<Option<User>> {
        self.read(&self.user_key)
    }

    pub fn load_session(&self) -> Result<Option<PersistedSession>> {
        self.read(&self.session_key)
    }

    pub fn save_user(&self, user: &User) -> Result<()> {
        self.write(&self.user_key, user)
    }

    pub fn save_session(&self, session: &PersistedSession) -> Result<()> {
        self.write(&self.session_key, session)
    }

    /// Remove both records. Both removals are attempted even if the first
    /// one fails.
    pub fn clear(&self) -> Result<()> {
        let user = self.store.remove(&self.user_key);
        let session = self.store.remove(&self.session_key);
        user.and(session)
            .map_err(|e| LiveChatError::StorageWrite(e.to_string()))
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self
            .store
            .get(key)
            .map_err(|e| LiveChatError::StorageRead(format!("{key}: {e}")))?
        else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| LiveChatError::StorageRead(format!("{key}: {e}")))
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| LiveChatError::StorageWrite(format!("{key}: {e}")))?;
        debug!(key, "saving chat record");
        self.store
            .set(key, &raw)
            .map_err(|e| LiveChatError::StorageWrite(format!("{key}: {e}")))
    }
}

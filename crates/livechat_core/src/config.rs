use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigFileError;
use crate::paths::{config_json_path, default_storage_dir, load_config_json};

const CONFIG_FILE_PATH: &str = "livechat.toml";

/// Settings shared by the HTTP client and the session core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveChatConfig {
    /// Base URL of the chat service, without a trailing `/livechat`.
    #[serde(default)]
    pub api_url: String,
    /// Per-deployment token; also namespaces the local store keys.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries for idempotent requests (config, history). Sends are never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for LiveChatConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            token: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            storage_dir: None,
        }
    }
}

impl LiveChatConfig {
    /// Load `~/.livechat/config.json`, falling back to `livechat.toml` in the
    /// working directory, then apply `LIVECHAT_*` environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(&config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Build a config for an explicit endpoint, keeping the other defaults.
    pub fn with_endpoint(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        match load_config_json::<LiveChatConfig>(json_path) {
            Ok(config) => return config,
            Err(ConfigFileError::NotFound(_)) => {}
            Err(err) => log::warn!("{err}"),
        }

        if toml_path.exists() {
            match std::fs::read_to_string(toml_path) {
                Ok(content) => match toml::from_str::<LiveChatConfig>(&content) {
                    Ok(config) => return config,
                    Err(err) => log::warn!("Failed to parse {}: {}", toml_path.display(), err),
                },
                Err(err) => log::warn!("Failed to read {}: {}", toml_path.display(), err),
            }
        }

        Self::default()
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_url) = lookup("LIVECHAT_API_URL") {
            self.api_url = api_url;
        }
        if let Some(token) = lookup("LIVECHAT_TOKEN") {
            self.token = token;
        }
        if let Some(secs) = lookup("LIVECHAT_POLL_INTERVAL_SECS").and_then(|v| v.trim().parse().ok()) {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = lookup("LIVECHAT_REQUEST_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.request_timeout_secs = secs;
        }
        if let Some(retries) = lookup("LIVECHAT_MAX_RETRIES").and_then(|v| v.trim().parse().ok()) {
            self.max_retries = retries;
        }
        if let Some(dir) = lookup("LIVECHAT_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
    }

    /// Both the endpoint and the token are required to talk to the service.
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty() && !self.token.trim().is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }

    /// Prefix of the local store keys for this deployment.
    pub fn storage_key(&self) -> String {
        format!("livechat_{}", self.token)
    }

    pub fn user_key(&self) -> String {
        format!("{}_user", self.storage_key())
    }

    pub fn session_key(&self) -> String {
        format!("{}_session", self.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_storage_keys_follow_token() {
        let config = LiveChatConfig::with_endpoint("https://chat.example.com/api", "abc");
        assert_eq!(config.user_key(), "livechat_abc_user");
        assert_eq!(config.session_key(), "livechat_abc_session");
    }

    #[test]
    fn test_is_configured_requires_both_fields() {
        assert!(!LiveChatConfig::default().is_configured());
        assert!(!LiveChatConfig::with_endpoint("https://x", " ").is_configured());
        assert!(LiveChatConfig::with_endpoint("https://x", "t").is_configured());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LIVECHAT_API_URL", "https://env.example.com"),
            ("LIVECHAT_TOKEN", "env-token"),
            ("LIVECHAT_POLL_INTERVAL_SECS", " 5 "),
            ("LIVECHAT_MAX_RETRIES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = LiveChatConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://env.example.com");
        assert_eq!(config.token, "env-token");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.max_retries, default_max_retries());
    }

    #[test]
    fn test_load_prefers_json_then_toml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("config.json");
        let toml_path = dir.path().join("livechat.toml");

        std::fs::write(&toml_path, "api_url = \"https://toml\"\ntoken = \"t\"\n").unwrap();
        let config = LiveChatConfig::load_from(&json_path, &toml_path);
        assert_eq!(config.api_url, "https://toml");
        assert_eq!(config.poll_interval_secs, 3);

        std::fs::write(&json_path, r#"{"api_url": "https://json", "token": "j"}"#).unwrap();
        let config = LiveChatConfig::load_from(&json_path, &toml_path);
        assert_eq!(config.api_url, "https://json");
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let mut config = LiveChatConfig::default();
        config.poll_interval_secs = 0;
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ConfigFileError;

/// Root directory for client files (`~/.livechat`).
pub fn livechat_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".livechat")
}

pub fn config_json_path() -> PathBuf {
    livechat_dir().join("config.json")
}

/// Default directory of the persistent local store.
pub fn default_storage_dir() -> PathBuf {
    livechat_dir().join("store")
}

pub fn load_config_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigFileError::NotFound(path.to_path_buf()),
        _ => ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigFileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn save_config_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ConfigFileError> {
    let io_err = |source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|source| ConfigFileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(io_err)
}

//! Session core error types

use livechat_client::ClientError;
use livechat_core::ValidationError;
use thiserror::Error;

/// Errors surfaced by [`SessionCore`](crate::SessionCore).
///
/// The display text is what a front-end shows in its error banner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiveChatError {
    #[error("API not initialized")]
    NotConfigured,

    #[error("User information not found")]
    NotInitialized,

    #[error("Chat has ended")]
    SessionEnded,

    /// Message reported by the service, shown unchanged.
    #[error("{0}")]
    RemoteRequest(String),

    #[error("Only JPG, JPEG and PNG files are accepted (got {content_type})")]
    UnsupportedFileType { content_type: String },

    #[error("File size cannot exceed 5MB")]
    FileTooLarge { size: u64 },

    #[error("{0}")]
    InvalidRegistration(ValidationError),

    #[error("Failed to read saved chat: {0}")]
    StorageRead(String),

    #[error("Failed to save chat: {0}")]
    StorageWrite(String),

    #[error("Polling failed: {0}")]
    Polling(String),
}

impl From<ValidationError> for LiveChatError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnsupportedFileType { content_type } => {
                Self::UnsupportedFileType { content_type }
            }
            ValidationError::FileTooLarge { size } => Self::FileTooLarge { size },
            other => Self::InvalidRegistration(other),
        }
    }
}

impl From<ClientError> for LiveChatError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Config(_) => Self::NotConfigured,
            other => Self::RemoteRequest(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LiveChatError>;

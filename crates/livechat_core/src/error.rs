use std::path::PathBuf;

use thiserror::Error;

/// Local validation failures, raised before anything is sent to the service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Phone is required")]
    PhoneRequired,

    #[error("Enter a valid phone number")]
    InvalidPhone,

    #[error("Only JPG, JPEG and PNG files are accepted (got {content_type})")]
    UnsupportedFileType { content_type: String },

    #[error("File size cannot exceed 5MB ({size} bytes)")]
    FileTooLarge { size: u64 },
}

/// Failures reading or writing a JSON config file.
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

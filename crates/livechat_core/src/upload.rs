//! File attachments sent through the chat.

use std::path::Path;

use bytes::Bytes;

use crate::error::ValidationError;

/// Largest accepted attachment (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Content types the service accepts.
pub const ALLOWED_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// A file picked by the user, held in memory until it is uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, deriving the content type from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, content_type_for(path), data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Check type and size. The type must match exactly; `image/jpg` or
    /// parameters such as `; charset=` are rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(ValidationError::UnsupportedFileType {
                content_type: self.content_type.clone(),
            });
        }
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::FileTooLarge { size: self.size() });
        }
        Ok(())
    }
}

/// Guess a content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn upload(content_type: &str, size: usize) -> FileUpload {
        FileUpload::new("file", content_type, vec![0u8; size])
    }

    #[test]
    fn test_accepts_small_jpeg() {
        assert_eq!(upload("image/jpeg", 1024 * 1024).validate(), Ok(()));
    }

    #[test]
    fn test_accepts_exact_limit() {
        assert_eq!(upload("image/png", MAX_UPLOAD_BYTES as usize).validate(), Ok(()));
    }

    #[test]
    fn test_rejects_large_png() {
        let result = upload("image/png", 6 * 1024 * 1024).validate();
        assert!(matches!(result, Err(ValidationError::FileTooLarge { .. })));
    }

    #[test]
    fn test_rejects_gif() {
        let result = upload("image/gif", 1024).validate();
        assert!(matches!(result, Err(ValidationError::UnsupportedFileType { .. })));
    }

    #[test]
    fn test_from_path_detects_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Photo.JPG");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"\xff\xd8\xff")
            .unwrap();

        let file = FileUpload::from_path(&path).unwrap();
        assert_eq!(file.name, "Photo.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.size(), 3);
    }
}

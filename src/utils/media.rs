// src/utils/media.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use url::Url;
use uuid::Uuid;

use crate::error::AppError;

/// Most files accepted in one request.
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Only images and videos are accepted, each at most `max_bytes`.
    pub fn validate(&self, max_bytes: usize) -> Result<(), AppError> {
        let mime = self.content_type.to_ascii_lowercase();
        if !(mime.starts_with("image/") || mime.starts_with("video/")) {
            return Err(AppError::Validation(
                "Only image or video files are allowed".to_string(),
            ));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "File '{}' exceeds the {} byte limit",
                self.file_name, max_bytes
            )));
        }
        Ok(())
    }
}

pub fn validate_uploads(uploads: &[Upload], max_bytes: usize) -> Result<(), AppError> {
    if uploads.len() > MAX_FILES_PER_REQUEST {
        return Err(AppError::Validation(format!(
            "At most {} files are allowed",
            MAX_FILES_PER_REQUEST
        )));
    }
    uploads.iter().try_for_each(|u| u.validate(max_bytes))
}

/// Object storage for uploaded media.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores the bytes and returns the public URL. Fails with `AppError::Storage`.
    async fn store(&self, bytes: Bytes, file_name: &str, content_type: &str) -> Result<String, AppError>;
}

/// Writes uploads into a local directory served under `public_url`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: Url,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf, public_url: Url) -> Self {
        Self { root, public_url }
    }
}

/// Keeps a short alphanumeric extension from the client's file name.
fn safe_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn store(&self, bytes: Bytes, file_name: &str, content_type: &str) -> Result<String, AppError> {
        let name = match safe_extension(file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to prepare upload directory: {}", e)))?;
        tokio::fs::write(self.root.join(&name), &bytes)
            .await
            .map_err(|e| {
                tracing::error!("Error writing upload {}: {:?}", name, e);
                AppError::Storage("Failed to upload file".to_string())
            })?;

        let url = self
            .public_url
            .join(&name)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::debug!(%content_type, size = bytes.len(), %url, "stored upload");
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, size: usize) -> Upload {
        Upload {
            file_name: "cat.png".to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn only_images_and_videos_pass() {
        assert!(upload("image/png", 10).validate(100).is_ok());
        assert!(upload("video/mp4", 10).validate(100).is_ok());
        assert!(upload("application/pdf", 10).validate(100).is_err());
        assert!(upload("image/png", 101).validate(100).is_err());
    }

    #[test]
    fn too_many_files_are_rejected() {
        let uploads = vec![upload("image/png", 1); MAX_FILES_PER_REQUEST + 1];
        assert!(validate_uploads(&uploads, 100).is_err());
        assert!(validate_uploads(&uploads[..MAX_FILES_PER_REQUEST], 100).is_ok());
    }

    #[test]
    fn extensions_are_sanitized() {
        assert_eq!(safe_extension("a.PNG").as_deref(), Some("png"));
        assert_eq!(safe_extension("noext"), None);
        assert_eq!(safe_extension("evil.p/h"), None);
    }

    #[tokio::test]
    async fn stores_under_the_public_url() {
        let dir = std::env::temp_dir().join(format!("hashthread-media-{}", Uuid::new_v4()));
        let store = LocalObjectStore::new(
            dir.clone(),
            Url::parse("http://cdn.test/uploads/").unwrap(),
        );
        let url = store
            .store(Bytes::from_static(b"abc"), "x.jpg", "image/jpeg")
            .await
            .unwrap();
        assert!(url.starts_with("http://cdn.test/uploads/"));
        assert!(url.ends_with(".jpg"));

        let name = url.rsplit('/').next().unwrap();
        assert_eq!(tokio::fs::read(dir.join(name)).await.unwrap(), b"abc");
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}

//! Binary asset host
//!
//! Media files that should not be inlined into a document are handed to an
//! [`AssetHost`], which stores the bytes and returns a retrievable URL.
//! Ships with an HTTP client for a hosted endpoint and a file-backed store
//! for tests and single-user local setups.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Accepts uploads at host-relative paths (`images/...`, `audio/...`) and
/// returns a URL the rendered entry can point at.
#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn upload(&self, path: &str, content_type: &str, data: &[u8]) -> Result<String>;
}

/// File-backed asset store rooted at a local directory.
#[derive(Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root directory if needed.
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Asset store initialized at: {:?}", self.root);
        Ok(())
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        // Upload paths are host-relative; anything trying to climb out of
        // the root is malformed.
        if path.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(AppError::AssetHost(format!("Invalid asset path: {path}")));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl AssetHost for LocalAssetStore {
    async fn upload(&self, path: &str, _content_type: &str, data: &[u8]) -> Result<String> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first (atomic write)
        let temp_path = target.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &target).await?;

        tracing::debug!("Stored asset: {} ({} bytes)", path, data.len());
        Ok(format!("file://{}", target.display()))
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Client for a hosted asset endpoint: POST the bytes, receive the
/// download URL.
#[derive(Clone)]
pub struct HttpAssetHost {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssetHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AssetHost for HttpAssetHost {
    async fn upload(&self, path: &str, content_type: &str, data: &[u8]) -> Result<String> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|err| AppError::RemoteUnavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| AppError::RemoteUnavailable(err.to_string()))?;

        let uploaded: UploadResponse = resp
            .json()
            .await
            .map_err(|err| AppError::AssetHost(format!("Malformed upload response: {err}")))?;

        tracing::debug!("Uploaded asset: {} -> {}", path, uploaded.url);
        Ok(uploaded.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (LocalAssetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(temp_dir.path().join("assets"));
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let (store, _temp) = create_test_store().await;

        let url = store
            .upload("images/1700000000000_photo.jpg", "image/jpeg", b"bytes")
            .await
            .unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with("images/1700000000000_photo.jpg"));

        let on_disk = fs::read(url.strip_prefix("file://").unwrap())
            .await
            .unwrap();
        assert_eq!(on_disk, b"bytes");
    }

    #[tokio::test]
    async fn test_upload_rejects_path_traversal() {
        let (store, _temp) = create_test_store().await;

        let err = store
            .upload("images/../../escape.jpg", "image/jpeg", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AssetHost(_)));
    }

    #[tokio::test]
    async fn test_upload_overwrites_existing_asset() {
        let (store, _temp) = create_test_store().await;

        store
            .upload("audio/1_clip.mp3", "audio/mpeg", b"first")
            .await
            .unwrap();
        let url = store
            .upload("audio/1_clip.mp3", "audio/mpeg", b"second")
            .await
            .unwrap();

        let on_disk = fs::read(url.strip_prefix("file://").unwrap())
            .await
            .unwrap();
        assert_eq!(on_disk, b"second");
    }
}

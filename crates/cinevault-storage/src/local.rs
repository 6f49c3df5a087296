use crate::traits::{validate_key, ByteStream, Storage, StorageError, StorageResult};
use crate::DOWNLOAD_CHUNK_SIZE;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation, used for development and tests.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        LocalStorage {
            base_path: base_path.into(),
        }
    }

    /// Convert a storage key to a filesystem path with traversal validation.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn ensure_bucket(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;
        Ok(())
    }

    async fn put_file(&self, key: &str, path: &Path, _content_type: &str) -> StorageResult<u64> {
        let dest = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&dest).await?;

        let mut source = fs::File::open(path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to open staging file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut file = fs::File::create(&dest).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", dest.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut source, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", dest.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", dest.display(), e))
        })?;

        tracing::info!(
            path = %dest.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(bytes_copied)
    }

    async fn open_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::with_capacity(file, DOWNLOAD_CHUNK_SIZE);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        let key = key.to_string();
        let path_display = path.display().to_string();
        let logged_stream = stream.map(move |item| {
            if item.is_err() {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
            }
            item
        });

        Ok(Box::pin(logged_stream))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(key = %key, "Local storage delete successful");

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    async fn stage_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).await.unwrap();
        file.write_all(content).await.unwrap();
        file.sync_all().await.unwrap();
        path
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_put_and_stream_round_trip() {
        let staging = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let storage = LocalStorage::new(store_dir.path());
        storage.ensure_bucket().await.unwrap();

        let data = b"movie bytes".to_vec();
        let staged = stage_file(staging.path(), "upload.mp4", &data).await;

        let size = storage
            .put_file("7/upload.mp4", &staged, "video/mp4")
            .await
            .unwrap();
        assert_eq!(size, data.len() as u64);

        let stream = storage.open_stream("7/upload.mp4").await.unwrap();
        assert_eq!(collect(stream).await, data);
    }

    #[tokio::test]
    async fn test_ensure_bucket_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("store"));

        storage.ensure_bucket().await.unwrap();
        storage.ensure_bucket().await.unwrap();
        assert!(dir.path().join("store").is_dir());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.ensure_bucket().await.unwrap();

        let result = storage.open_stream("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_open_stream_missing_key() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.ensure_bucket().await.unwrap();

        let result = storage.open_stream("7/missing.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.ensure_bucket().await.unwrap();

        assert!(storage.delete("7/nothing.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_overwrite_same_key() {
        let staging = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let storage = LocalStorage::new(store_dir.path());
        storage.ensure_bucket().await.unwrap();

        let first = stage_file(staging.path(), "a.mp4", b"first").await;
        let second = stage_file(staging.path(), "b.mp4", b"second").await;

        storage.put_file("7/movie.mp4", &first, "video/mp4").await.unwrap();
        storage.put_file("7/movie.mp4", &second, "video/mp4").await.unwrap();

        let stream = storage.open_stream("7/movie.mp4").await.unwrap();
        assert_eq!(collect(stream).await, b"second");

        assert!(storage.exists("7/movie.mp4").await.unwrap());
        storage.delete("7/movie.mp4").await.unwrap();
        assert!(!storage.exists("7/movie.mp4").await.unwrap());
    }
}

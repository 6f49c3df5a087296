//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob store backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;

/// Chunk size for streamed downloads.
pub const DOWNLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Lazy chunked byte stream over a stored blob. Finite and non-restartable.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All blob store backends (S3, local filesystem) implement this trait so the
/// streaming pipeline can work against any backend without coupling to
/// implementation details.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Ensure the backing bucket (or directory) exists. Idempotent: an
    /// already-existing bucket is success. Called once at startup; failure
    /// is fatal for the process.
    async fn ensure_bucket(&self) -> StorageResult<()>;

    /// Upload a staged file to the given key, streaming from disk without
    /// buffering the whole file in memory. Returns the number of bytes stored.
    /// Uploading to an existing key overwrites the blob.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<u64>;

    /// Open a blob for reading as a chunked byte stream.
    ///
    /// Returns `NotFound` when the key has no blob (e.g. orphaned metadata).
    async fn open_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Delete a blob by key
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if a blob exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Reject keys that could escape the store's namespace.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

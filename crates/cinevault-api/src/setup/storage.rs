//! Blob store setup

use anyhow::{Context, Result};
use cinevault_core::config::StorageBackendKind;
use cinevault_core::Config;
use cinevault_storage::{LocalStorage, S3Storage, Storage};
use std::sync::Arc;

/// Construct the configured storage backend and ensure the bucket exists.
/// An unreachable or unwritable store is a startup failure.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackendKind::S3 => {
            tracing::info!(
                bucket = %config.s3_bucket,
                endpoint = ?config.s3_endpoint,
                "Initializing S3 storage"
            );
            Arc::new(
                S3Storage::new(
                    config.s3_bucket.clone(),
                    config.s3_region.clone(),
                    config.s3_endpoint.clone(),
                    config.s3_access_key.clone(),
                    config.s3_secret_key.clone(),
                )
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize S3 storage: {}", e))?,
            )
        }
        StorageBackendKind::Local => {
            tracing::info!(path = %config.local_storage_path, "Initializing local storage");
            Arc::new(LocalStorage::new(&config.local_storage_path))
        }
    };

    storage
        .ensure_bucket()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to ensure storage bucket")?;

    Ok(storage)
}

//! Cinevault Storage Library
//!
//! Storage abstraction over the movie blob store. Includes the Storage trait
//! and implementations for S3-compatible object stores (MinIO in development)
//! and the local filesystem.
//!
//! # Storage key format
//!
//! Keys are derived from the uploading user and filename: `{owner_id}/{filename}`.
//! Keys must not contain `..` or a leading `/`. A re-upload of the same filename
//! by the same owner overwrites the blob.

pub mod local;
pub mod s3;
pub mod traits;

pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, DOWNLOAD_CHUNK_SIZE};

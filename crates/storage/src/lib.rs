//! Blob storage for generated slide images.
//!
//! The pipeline persists images through the [`BlobStore`] trait so the
//! backing store can be swapped (local disk in development and tests, an
//! object store in production) without touching generation code.

pub mod key;
pub mod local;

use async_trait::async_trait;

pub use key::slide_image_key;
pub use local::LocalBlobStore;

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error writing blob '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),
}

/// Blob store keyed by relative path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `key`, overwriting any existing blob.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Fetch the blob stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Public URL the API serves this blob from.
    fn public_url(&self, key: &str) -> String;
}

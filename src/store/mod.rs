//! Object store client used by the gallery.
//!
//! The application only needs three operations from the blob store: make sure
//! the container exists, write a blob (create-or-overwrite), and list every
//! blob name in the container. [`BlobStore`] captures exactly that so handlers
//! can be exercised against an in-memory double while production talks to
//! Azure Blob Storage through [`azure::AzureBlobStore`].

pub mod azure;
pub mod connection_string;
pub mod shared_key;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use azure::AzureBlobStore;
pub use connection_string::{ConnectionStringError, Credential, StorageConnection};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage service answered with a non-success status.
    #[error("storage service returned {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode storage response: {0}")]
    Decode(String),
    #[error("invalid storage url: {0}")]
    InvalidUrl(String),
    #[error("could not sign storage request: {0}")]
    Credential(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A flat, container-scoped blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the configured container with public read access if it does not
    /// exist yet. An already existing container is not an error.
    async fn ensure_container(&self) -> StoreResult<()>;

    /// Write `data` under `name`, replacing any blob with the same name.
    async fn put_blob(&self, name: &str, content_type: &str, data: Bytes) -> StoreResult<()>;

    /// Return the name of every blob in the container, in store order.
    async fn list_blob_names(&self) -> StoreResult<Vec<String>>;
}

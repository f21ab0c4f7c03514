//! An image on its way into, or already in, the blob store.

use bytes::Bytes;
use serde::Serialize;

/// A file taken from the upload form, before validation.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as sent by the client, unsanitized.
    pub filename: String,

    /// Declared MIME type of the form part.
    pub content_type: String,

    /// Full payload, read from the form part.
    pub data: Bytes,
}

impl ImageUpload {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// A successfully stored image.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredImage {
    /// Blob name: `<YYYYMMDDTHHMMSS>-<sanitized filename>`.
    pub name: String,

    /// Public URL: `<base>/<container>/<name>`.
    pub url: String,
}

//! GalleryService — upload and listing on top of a [`BlobStore`].
//!
//! The service owns no state besides the shared store handle and the public
//! URL prefix, so it is cheap to clone into every request.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::{
    models::image::{ImageUpload, StoredImage},
    services::{
        naming::{blob_name, sanitize_filename},
        validation::{ValidationError, validate},
    },
    store::{BlobStore, StoreError},
};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type GalleryResult<T> = Result<T, GalleryError>;

#[derive(Clone)]
pub struct GalleryService {
    /// Long-lived store client shared by all requests.
    pub store: Arc<dyn BlobStore>,

    /// `<public base url>/<container>`, without a trailing slash.
    container_url: String,
}

impl GalleryService {
    pub fn new(store: Arc<dyn BlobStore>, public_base_url: &str, container: &str) -> Self {
        Self {
            store,
            container_url: format!("{}/{}", public_base_url.trim_end_matches('/'), container),
        }
    }

    /// Public URL of a blob: `<base>/<container>/<name>`.
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.container_url, name)
    }

    /// Validate, name and store an upload using the current UTC time.
    pub async fn upload(&self, upload: ImageUpload) -> GalleryResult<StoredImage> {
        self.upload_at(Utc::now(), upload).await
    }

    /// Same as [`upload`](Self::upload) with an explicit timestamp.
    pub async fn upload_at(
        &self,
        now: DateTime<Utc>,
        upload: ImageUpload,
    ) -> GalleryResult<StoredImage> {
        validate(&upload)?;

        // A name with nothing safe left in it is stored as the bare prefix.
        let name = blob_name(now, &sanitize_filename(&upload.filename));
        self.store
            .put_blob(&name, &upload.content_type, upload.data)
            .await?;

        let url = self.public_url(&name);
        info!("Uploaded: {}", url);
        Ok(StoredImage { name, url })
    }

    /// Public URLs of every stored image, newest first.
    ///
    /// Relies on the timestamp prefix: a descending lexical sort puts later
    /// uploads before earlier ones. The whole container is listed each call.
    pub async fn gallery(&self) -> GalleryResult<Vec<String>> {
        let mut urls: Vec<String> = self
            .store
            .list_blob_names()
            .await?
            .iter()
            .map(|name| self.public_url(name))
            .collect();
        urls.sort_unstable_by(|a, b| b.cmp(a));
        Ok(urls)
    }
}

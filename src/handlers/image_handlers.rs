//! HTTP handlers for uploading images and listing the gallery.
//! Validation and naming live in `GalleryService`; these handlers only pull
//! the file out of the form and shape the JSON replies.

use crate::{
    errors::AppError,
    models::image::ImageUpload,
    services::{
        gallery_service::{GalleryError, GalleryService},
        validation::{MAX_IMAGE_BYTES, ValidationError, check_declared, check_size},
    },
};
use axum::{
    Json,
    extract::{Multipart, State},
};
use bytes::BytesMut;
use serde::Serialize;
use tracing::{debug, error};

/// Multipart form field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub ok: bool,
    pub gallery: Vec<String>,
}

/// `POST /api/v1/upload` — store one image from the `file` form field.
pub async fn upload_image(
    State(service): State<GalleryService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_file_field(&mut multipart)
        .await
        .inspect_err(|err| debug!("upload rejected: {}", err))?;

    match service.upload(upload).await {
        Ok(stored) => Ok(Json(UploadResponse {
            ok: true,
            url: stored.url,
        })),
        Err(GalleryError::Store(err)) => {
            error!("Upload failed: {}", err);
            Err(err.into())
        }
        Err(err) => {
            debug!("upload rejected: {}", err);
            Err(err.into())
        }
    }
}

/// `GET /api/v1/gallery` — every stored image URL, newest first.
pub async fn list_gallery(
    State(service): State<GalleryService>,
) -> Result<Json<GalleryResponse>, AppError> {
    match service.gallery().await {
        Ok(gallery) => Ok(Json(GalleryResponse { ok: true, gallery })),
        Err(err) => {
            error!("Gallery failed: {}", err);
            Err(err.into())
        }
    }
}

/// Find the first file part named `file` and read it.
///
/// Header checks run before the body is read, and reading stops as soon as
/// the size limit is crossed, so oversized files are never fully buffered.
/// Parts without a filename are plain form fields and are skipped.
async fn read_file_field(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        check_declared(&filename, &content_type)?;

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            data.extend_from_slice(&chunk);
            if data.len() > MAX_IMAGE_BYTES {
                break;
            }
        }
        check_size(data.len())?;

        return Ok(ImageUpload {
            filename,
            content_type,
            data: data.freeze(),
        });
    }

    Err(ValidationError::NoFile.into())
}

//! Upload validation policy.
//!
//! Checks run in a fixed order and the first failure wins: file present,
//! filename non-empty, declared type `image/*`, size within
//! [`MAX_IMAGE_BYTES`]. Nothing reaches the store unless all of them pass.

use thiserror::Error;

use crate::models::image::ImageUpload;

/// Largest accepted upload, 10 MiB.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file uploaded")]
    NoFile,
    #[error("Empty filename")]
    EmptyFilename,
    #[error("Only image files allowed")]
    WrongType,
    #[error("File too large (max 10MB)")]
    TooLarge,
}

/// Checks that only need the form part's headers.
pub fn check_declared(filename: &str, content_type: &str) -> Result<(), ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    if !is_image_type(content_type) {
        return Err(ValidationError::WrongType);
    }
    Ok(())
}

pub fn check_size(size_bytes: usize) -> Result<(), ValidationError> {
    if size_bytes > MAX_IMAGE_BYTES {
        return Err(ValidationError::TooLarge);
    }
    Ok(())
}

/// Run every check against a fully read upload.
pub fn validate(upload: &ImageUpload) -> Result<(), ValidationError> {
    check_declared(&upload.filename, &upload.content_type)?;
    check_size(upload.size_bytes())
}

fn is_image_type(content_type: &str) -> bool {
    content_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

//! Defines the routes of the gallery service.
//!
//! ## Structure
//! - `GET  /`               — static upload page
//! - `POST /api/v1/upload`  — upload one image (multipart field `file`)
//! - `GET  /api/v1/gallery` — list image URLs, newest first
//! - `GET  /api/v1/health`  — liveness

use crate::{
    handlers::{
        health_handlers::health,
        image_handlers::{list_gallery, upload_image},
        page_handlers::index,
    },
    services::gallery_service::GalleryService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the router for all endpoints, without state attached.
///
/// The upload route has no transport body limit. The handler stops buffering
/// once the file passes the image cap and answers 400 for any oversized file.
pub fn routes() -> Router<GalleryService> {
    Router::new()
        .route("/", get(index))
        .route("/api/v1/health", get(health))
        .route("/api/v1/gallery", get(list_gallery))
        .route(
            "/api/v1/upload",
            post(upload_image).layer(DefaultBodyLimit::disable()),
        )
}

/// The complete application with its service attached.
pub fn router(service: GalleryService) -> Router {
    routes().with_state(service)
}

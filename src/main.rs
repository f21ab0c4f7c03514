use anyhow::{Context, Result};
use image_gallery::{
    config::AppConfig,
    routes::routes::router,
    services::gallery_service::GalleryService,
    store::{AzureBlobStore, BlobStore},
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Environment file, if any ---
    dotenvy::dotenv().ok();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting image-gallery with config: {:?}", cfg);

    // --- Blob store client, shared by every request ---
    let store = AzureBlobStore::new(cfg.connection.clone(), cfg.container.clone())
        .context("building blob store client")?;

    // The container may already exist or be managed elsewhere; keep serving.
    if let Err(err) = store.ensure_container().await {
        tracing::warn!(
            "Could not ensure container {} exists: {}",
            cfg.container,
            err
        );
    }

    let service = GalleryService::new(Arc::new(store), &cfg.public_base_url, &cfg.container);

    // --- Build router ---
    let app = router(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use gallery_core::config::{dir_from_env_value, max_upload_bytes_from_env_value};
use gallery_core::{
    CoreConfig, DEFAULT_ARCHIVE_DIR, DEFAULT_GALLERY_DIR, DEFAULT_UPLOAD_DIR, GalleryService,
};

/// Main entry point for the gallery server
///
/// Serves the REST API (with OpenAPI/Swagger documentation) until Ctrl-C is received, then
/// lets in-flight requests finish.
///
/// # Environment Variables
/// - `GALLERY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `GALLERY_DIR`: Directory holding the galleries (default: "gallery")
/// - `GALLERY_UPLOAD_DIR`: Staging directory for uploads (default: "files/upload_image")
/// - `GALLERY_ARCHIVE_DIR`: Directory for temporary zip archives (default: "files/gallery_zip")
/// - `GALLERY_MAX_UPLOAD_BYTES`: Upload body limit in bytes (default: 25 MiB)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid (for example, the gallery directory does not exist),
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gallery_run=info".parse()?)
                .add_directive("gallery_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("GALLERY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        dir_from_env_value(std::env::var("GALLERY_DIR").ok(), DEFAULT_GALLERY_DIR),
        dir_from_env_value(std::env::var("GALLERY_UPLOAD_DIR").ok(), DEFAULT_UPLOAD_DIR),
        dir_from_env_value(std::env::var("GALLERY_ARCHIVE_DIR").ok(), DEFAULT_ARCHIVE_DIR),
    )?);
    let max_upload_bytes =
        max_upload_bytes_from_env_value(std::env::var("GALLERY_MAX_UPLOAD_BYTES").ok())?;

    tracing::info!(
        "Serving galleries from {} (uploads staged in {}, archives in {})",
        cfg.gallery_dir().display(),
        cfg.upload_dir().display(),
        cfg.archive_dir().display()
    );

    let app = router(AppState::new(GalleryService::new(cfg)?, max_upload_bytes));

    tracing::info!("++ Starting gallery REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Gallery REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

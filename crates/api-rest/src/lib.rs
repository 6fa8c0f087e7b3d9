//! # API REST
//!
//! REST API implementation for the gallery service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart uploads, streamed archives, CORS, error bodies)
//!
//! Uses `api-shared` for wire types and `gallery-core` for every operation.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use api_shared::pb;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use gallery_core::GalleryService;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Application state shared across REST API handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: GalleryService,
    /// Upper bound for an upload request body, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: GalleryService, max_upload_bytes: usize) -> Self {
        Self {
            service,
            max_upload_bytes,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_galleries,
        handlers::create_gallery,
        handlers::list_photos,
        handlers::upload_photo,
        handlers::delete_gallery,
        handlers::delete_photo,
        handlers::download_gallery,
        handlers::resized_image,
    ),
    components(schemas(
        pb::HealthRes,
        pb::GallerySummary,
        pb::GalleriesRes,
        pb::CreateGalleryReq,
        pb::PhotoSummary,
        pb::PhotosRes,
        pb::UploadedPhoto,
        pb::UploadRes,
        pb::AckRes,
        pb::ErrorDetail,
        pb::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST application.
///
/// `/galleries/download/:gallery` is a static-prefix route and wins over
/// `/galleries/:gallery/:image`, so DELETE on it is routed to the photo delete of the gallery
/// named `download`.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/galleries",
            get(handlers::list_galleries).post(handlers::create_gallery),
        )
        .route(
            "/galleries/:gallery",
            get(handlers::list_photos)
                .post(handlers::upload_photo)
                .delete(handlers::delete_gallery)
                .layer(upload_limit),
        )
        .route("/galleries/:gallery/:image", delete(handlers::delete_photo))
        .route(
            "/galleries/download/:gallery",
            get(handlers::download_gallery).delete(handlers::delete_download_photo),
        )
        .route(
            "/images/:size/:gallery/:image",
            get(handlers::resized_image),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

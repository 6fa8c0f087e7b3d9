//! Error mapper.
//!
//! The single place where a [`GalleryError`] becomes an HTTP response. Every failure is logged
//! here before it is turned into `{ "error": { "status", "message" } }`; internal failures are
//! reported to the client with a generic message only.

use api_shared::{ErrorDetail, ErrorRes};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use gallery_core::GalleryError;

/// A [`GalleryError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub GalleryError);

impl From<GalleryError> for ApiError {
    fn from(err: GalleryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if err.is_client_error() {
            tracing::warn!("Request rejected: {}", err);
        } else {
            tracing::error!("Request failed: {:?}", err);
        }

        error_response(status, err.public_message(), err.details().cloned())
    }
}

fn error_response(
    status: StatusCode,
    message: String,
    details: Option<serde_json::Value>,
) -> Response {
    let body = ErrorRes {
        error: ErrorDetail {
            status: status.as_u16(),
            message,
            details,
        },
    };

    (status, Json(body)).into_response()
}

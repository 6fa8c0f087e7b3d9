//! REST handlers.
//!
//! Each handler extracts path parameters and bodies, calls one [`GalleryService`] operation and
//! writes the success response. Failures are returned as [`ApiError`] and rendered by the
//! error mapper. Every service call touches the filesystem and runs on the blocking pool; the
//! only async I/O is streaming upload parts and archive bodies.

use std::pin::Pin;
use std::task::{Context, Poll};

use api_shared::{
    pb, AckRes, CreateGalleryReq, GalleriesRes, GallerySummary, HealthService, PhotosRes,
    UploadRes,
};
use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Path as AxumPath, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures_util::Stream;
use gallery_core::{validation::parse_dimensions, GalleryError, GalleryResult, GalleryService};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::{ApiError, AppState};

/// Multipart field carrying the uploaded photo.
pub const UPLOAD_FIELD: &str = "image";

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<pb::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/galleries",
    responses(
        (status = 200, description = "List of galleries", body = GalleriesRes),
        (status = 500, description = "Internal server error", body = pb::ErrorRes)
    )
)]
/// List all galleries
///
/// Returns every directory under the gallery root, sorted by name.
#[axum::debug_handler]
pub async fn list_galleries(State(state): State<AppState>) -> Result<Json<GalleriesRes>, ApiError> {
    let service = state.service.clone();
    Ok(Json(blocking(move || service.list_galleries()).await?))
}

#[utoipa::path(
    post,
    path = "/galleries",
    request_body = CreateGalleryReq,
    responses(
        (status = 201, description = "Gallery created", body = GallerySummary),
        (status = 400, description = "Invalid request body", body = pb::ErrorRes),
        (status = 409, description = "Gallery already exists", body = pb::ErrorRes),
        (status = 500, description = "Internal server error", body = pb::ErrorRes)
    )
)]
/// Create a new, empty gallery
///
/// The body must be a JSON object with a single non-empty string property `name`. Bodies that
/// do not parse are reported as validation failures (400) rather than axum's default 422.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not a JSON object with only a `name` property,
/// - `name` is missing, empty, or not a single path component.
///
/// Returns `409 Conflict` if a gallery with this name already exists.
#[axum::debug_handler]
pub async fn create_gallery(
    State(state): State<AppState>,
    body: Result<Json<CreateGalleryReq>, JsonRejection>,
) -> Result<(StatusCode, Json<GallerySummary>), ApiError> {
    let Json(req) = body.map_err(|rejection| GalleryError::Validation {
        message: format!("Bad JSON object: {}", rejection.body_text()),
        details: None,
    })?;

    let service = state.service.clone();
    let created = blocking(move || service.create_gallery(&req)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/galleries/{gallery}",
    params(("gallery" = String, Path, description = "Gallery name")),
    responses(
        (status = 200, description = "Photos in the gallery", body = PhotosRes),
        (status = 404, description = "Gallery not found", body = pb::ErrorRes),
        (status = 500, description = "Internal server error", body = pb::ErrorRes)
    )
)]
/// List the photos of one gallery
#[axum::debug_handler]
pub async fn list_photos(
    State(state): State<AppState>,
    AxumPath(gallery): AxumPath<String>,
) -> Result<Json<PhotosRes>, ApiError> {
    let service = state.service.clone();
    Ok(Json(blocking(move || service.list_photos(&gallery)).await?))
}

#[utoipa::path(
    post,
    path = "/galleries/{gallery}",
    params(("gallery" = String, Path, description = "Gallery name")),
    responses(
        (status = 201, description = "Photo uploaded", body = UploadRes),
        (status = 400, description = "Empty request or no `image` part", body = pb::ErrorRes),
        (status = 404, description = "Gallery not found", body = pb::ErrorRes),
        (status = 409, description = "A file with this name already exists", body = pb::ErrorRes),
        (status = 500, description = "Internal server error", body = pb::ErrorRes)
    )
)]
/// Upload a photo into a gallery
///
/// Expects a `multipart/form-data` body with the photo in the `image` part; the part's file
/// name becomes the photo's file name. Other parts are ignored. The gallery is checked before
/// the body is read, and the part is streamed into a staging file that is moved into the
/// gallery without ever replacing an existing file.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the request declares `Content-Length: 0`,
/// - the body is not multipart, or has no `image` part with a file name.
///
/// Returns `404 Not Found` if the gallery does not exist, and `409 Conflict` if the gallery
/// already contains a file with this name.
#[axum::debug_handler]
pub async fn upload_photo(
    State(state): State<AppState>,
    AxumPath(gallery): AxumPath<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadRes>), ApiError> {
    let service = state.service.clone();
    let name = gallery.clone();
    blocking(move || service.require_gallery(&name)).await?;

    if content_length(&headers) == Some(0) {
        return Err(GalleryError::BadRequest("Invalid request - empty body.".into()).into());
    }

    let mut multipart = multipart.map_err(|rejection| {
        GalleryError::BadRequest(format!("Invalid request - {}", rejection.body_text()))
    })?;

    let (file_name, staged) = stage_upload(&state.service, &mut multipart).await?;

    let service = state.service.clone();
    let uploaded = blocking(move || service.upload_photo(&gallery, file_name.as_deref(), staged))
        .await?;

    Ok((StatusCode::CREATED, Json(uploaded)))
}

#[utoipa::path(
    delete,
    path = "/galleries/{gallery}",
    params(("gallery" = String, Path, description = "Gallery name")),
    responses(
        (status = 200, description = "Gallery deleted", body = AckRes),
        (status = 404, description = "Gallery not found", body = pb::ErrorRes),
        (status = 409, description = "Gallery is not empty", body = pb::ErrorRes)
    )
)]
/// Delete an empty gallery
#[axum::debug_handler]
pub async fn delete_gallery(
    State(state): State<AppState>,
    AxumPath(gallery): AxumPath<String>,
) -> Result<Json<AckRes>, ApiError> {
    let service = state.service.clone();
    Ok(Json(blocking(move || service.delete(&gallery, None)).await?))
}

#[utoipa::path(
    delete,
    path = "/galleries/{gallery}/{image}",
    params(
        ("gallery" = String, Path, description = "Gallery name"),
        ("image" = String, Path, description = "Photo file name")
    ),
    responses(
        (status = 200, description = "Photo deleted", body = AckRes),
        (status = 404, description = "Gallery or photo not found", body = pb::ErrorRes)
    )
)]
/// Delete one photo
#[axum::debug_handler]
pub async fn delete_photo(
    State(state): State<AppState>,
    AxumPath((gallery, image)): AxumPath<(String, String)>,
) -> Result<Json<AckRes>, ApiError> {
    let service = state.service.clone();
    Ok(Json(
        blocking(move || service.delete(&gallery, Some(&image))).await?,
    ))
}

/// Delete one photo from the gallery named `download`
///
/// `/galleries/download/:gallery` shadows `/galleries/:gallery/:image` for that gallery.
#[axum::debug_handler]
pub async fn delete_download_photo(
    State(state): State<AppState>,
    AxumPath(image): AxumPath<String>,
) -> Result<Json<AckRes>, ApiError> {
    let service = state.service.clone();
    Ok(Json(
        blocking(move || service.delete("download", Some(&image))).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/galleries/download/{gallery}",
    params(("gallery" = String, Path, description = "Gallery name")),
    responses(
        (status = 200, description = "Zip archive of the gallery (application/zip)"),
        (status = 404, description = "Gallery not found", body = pb::ErrorRes),
        (status = 500, description = "Internal server error", body = pb::ErrorRes)
    )
)]
/// Download a gallery as a zip archive
///
/// The archive is built into a temporary file which the response body streams and owns: the
/// file is deleted once the body is dropped, whether it was sent completely or not.
#[axum::debug_handler]
pub async fn download_gallery(
    State(state): State<AppState>,
    AxumPath(gallery): AxumPath<String>,
) -> Result<Response, ApiError> {
    let service = state.service.clone();
    let name = gallery.clone();
    let archive = blocking(move || service.download_gallery(&name)).await?;

    let body = ArchiveStream::open(archive).map_err(GalleryError::Io)?;
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/zip"),
        ),
        (header::CONTENT_DISPOSITION, attachment_header(&gallery)),
    ];

    Ok((headers, Body::from_stream(body)).into_response())
}

#[utoipa::path(
    get,
    path = "/images/{size}/{gallery}/{image}",
    params(
        ("size" = String, Path, description = "`<width>x<height>`, 0 leaves an axis unconstrained"),
        ("gallery" = String, Path, description = "Gallery name"),
        ("image" = String, Path, description = "Photo file name")
    ),
    responses(
        (status = 200, description = "Resized image, content type from the file extension"),
        (status = 400, description = "Invalid or oversized size segment", body = pb::ErrorRes),
        (status = 404, description = "Photo not found", body = pb::ErrorRes),
        (status = 500, description = "Resize failed", body = pb::ErrorRes)
    )
)]
/// Fetch a resized rendition of one photo
#[axum::debug_handler]
pub async fn resized_image(
    State(state): State<AppState>,
    AxumPath((size, gallery, image)): AxumPath<(String, String, String)>,
) -> Result<Response, ApiError> {
    let size = parse_dimensions(&size)?;

    let service = state.service.clone();
    let rendition = blocking(move || service.resized_image(&gallery, &image, size)).await?;

    Ok((
        [(header::CONTENT_TYPE, rendition.content_type)],
        rendition.bytes,
    )
        .into_response())
}

/// JSON 404 for unknown routes.
pub async fn fallback() -> ApiError {
    GalleryError::NotFound("Not Found".into()).into()
}

/// Streams the `image` part of an upload into a new staging file.
///
/// Returns the part's file name (if it had one) and the staged file.
async fn stage_upload(
    service: &GalleryService,
    multipart: &mut Multipart,
) -> GalleryResult<(Option<String>, NamedTempFile)> {
    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let staged = service.staging_file()?;
        let mut writer = tokio::fs::File::from_std(staged.reopen()?);

        while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        return Ok((file_name, staged));
    }

    Err(GalleryError::BadRequest(
        "Invalid request - file not found.".into(),
    ))
}

fn bad_multipart(err: MultipartError) -> GalleryError {
    GalleryError::BadRequest(format!("Invalid request - {}", err.body_text()))
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Runs blocking gallery work off the async executor.
async fn blocking<T, F>(f: F) -> GalleryResult<T>
where
    F: FnOnce() -> GalleryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GalleryError::Internal(format!("blocking task failed: {e}")))?
}

/// `Content-Disposition` for `<gallery>.zip`.
///
/// Plain ASCII names go in `filename`; anything else falls back to an RFC 5987 `filename*`.
fn attachment_header(gallery: &str) -> HeaderValue {
    let plain = gallery
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\');

    let value = if plain {
        format!("attachment; filename=\"{gallery}.zip\"")
    } else {
        format!(
            "attachment; filename=\"gallery.zip\"; filename*=UTF-8''{}.zip",
            rfc5987_encode(gallery)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn rfc5987_encode(input: &str) -> String {
    const ATTR_CHARS: &[u8] = b"!#$&+-.^_`|~";
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut out = String::with_capacity(input.len() * 3);
    for &b in input.as_bytes() {
        if b.is_ascii_alphanumeric() || ATTR_CHARS.contains(&b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[usize::from(b >> 4)] as char);
            out.push(HEX[usize::from(b & 0x0f)] as char);
        }
    }
    out
}

/// Body stream over a temporary archive that deletes the file when dropped.
struct ArchiveStream {
    inner: ReaderStream<tokio::fs::File>,
    // Declared after `inner` so the file handle is closed before the path is removed.
    _archive: TempPath,
}

impl ArchiveStream {
    fn open(archive: NamedTempFile) -> std::io::Result<Self> {
        let (mut file, path) = archive.into_parts();
        std::io::Seek::rewind(&mut file)?;

        Ok(Self {
            inner: ReaderStream::new(tokio::fs::File::from_std(file)),
            _archive: path,
        })
    }
}

impl Stream for ArchiveStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_header_plain() {
        let value = attachment_header("trip");
        assert_eq!(value.to_str().unwrap(), "attachment; filename=\"trip.zip\"");
    }

    #[test]
    fn test_attachment_header_non_ascii() {
        let value = attachment_header("über \"best\"");
        let value = value.to_str().unwrap();
        assert!(value.contains("filename=\"gallery.zip\""));
        assert!(value.contains("filename*=UTF-8''%C3%BCber%20%22best%22.zip"));
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert_eq!(content_length(&headers), Some(0));
    }
}

//! Request and response bodies of the gallery API.
//!
//! Field names are part of the public contract. Note that photo listings use `fullpath` while
//! upload responses use `fullPath`; existing clients depend on both spellings.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A gallery as it appears in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GallerySummary {
    /// URI-encoded gallery name
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GalleriesRes {
    pub galleries: Vec<GallerySummary>,
}

/// Body of `POST /galleries`.
///
/// Unknown properties are rejected. `name` is optional at the type level so that a missing
/// name is reported by validation (`required`) rather than as a deserialisation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateGalleryReq {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
}

/// A photo as it appears in a gallery listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotoSummary {
    /// URI-encoded gallery name
    pub path: String,
    /// `<gallery>/<file name>`
    pub fullpath: String,
    /// File name without its extension
    pub name: String,
    /// Last modification time, ISO-8601 UTC with milliseconds
    pub modified: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotosRes {
    pub gallery: GallerySummary,
    pub images: Vec<PhotoSummary>,
}

/// A photo accepted by `POST /galleries/{gallery}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadedPhoto {
    /// File name as uploaded
    pub path: String,
    #[serde(rename = "fullPath")]
    pub full_path: String,
    pub name: String,
    pub modified: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    pub uploaded: Vec<UploadedPhoto>,
}

/// Acknowledgement of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AckRes {
    /// Always `"success"`
    pub status: String,
    pub message: String,
}

impl AckRes {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub status: u16,
    pub message: String,
    /// Validator error list, present on schema validation failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorDetail,
}

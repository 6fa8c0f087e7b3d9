//! Input validation utilities.
//!
//! Everything that arrives from a client (JSON bodies, URL segments, multipart file names) is
//! checked here before it is used to build a path.

use crate::constants::MAX_RENDER_SIDE;
use crate::render::Dimensions;
use crate::{GalleryError, GalleryResult};
use api_shared::CreateGalleryReq;
use gallery_types::PathComponent;
use validator::Validate;

/// Validates a create-gallery body and returns the gallery name.
///
/// Schema failures (missing or empty `name`) carry the validator's error list; a name that
/// passes the schema but is not a single safe path component is rejected as well.
///
/// # Errors
///
/// Returns `GalleryError::Validation` if the body is invalid.
pub fn validate_create_gallery(req: &CreateGalleryReq) -> GalleryResult<PathComponent> {
    if let Err(errors) = req.validate() {
        return Err(GalleryError::Validation {
            message: format!("Bad JSON object: {errors}"),
            details: serde_json::to_value(&errors).ok(),
        });
    }

    let raw = req.name.as_deref().unwrap_or_default();
    PathComponent::new(raw).map_err(|e| GalleryError::Validation {
        message: format!("Bad JSON object: name: {e}"),
        details: None,
    })
}

/// Resolves a gallery or photo name taken from a URL.
///
/// A name that cannot be a path component cannot exist either, so it is reported as missing.
///
/// # Errors
///
/// Returns `GalleryError::NotFound` if `raw` is not a valid path component.
pub fn existing_name(kind: &str, raw: &str) -> GalleryResult<PathComponent> {
    PathComponent::new(raw).map_err(|_| GalleryError::NotFound(format!("{kind} not found")))
}

/// Validates the file name of an uploaded part.
///
/// # Errors
///
/// Returns `GalleryError::BadRequest` if the name is missing or not a valid path component.
pub fn upload_file_name(raw: Option<&str>) -> GalleryResult<PathComponent> {
    let raw = raw.ok_or_else(|| {
        GalleryError::BadRequest("Invalid request - file name missing.".into())
    })?;

    PathComponent::new(raw)
        .map_err(|e| GalleryError::BadRequest(format!("Invalid file name: {e}")))
}

/// Parses a `<width>x<height>` segment, e.g. `800x0`.
///
/// Both parts must be non-negative integers no larger than [`MAX_RENDER_SIDE`]; `0` leaves
/// that axis unconstrained.
///
/// # Errors
///
/// Returns `GalleryError::BadRequest` for anything else.
pub fn parse_dimensions(raw: &str) -> GalleryResult<Dimensions> {
    let invalid = || {
        GalleryError::BadRequest(format!(
            "Invalid size '{raw}', expected <width>x<height>"
        ))
    };

    let (width, height) = raw.split_once(['x', 'X']).ok_or_else(invalid)?;
    let parse = |part: &str| -> GalleryResult<u32> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        match part.parse::<u32>() {
            Ok(side) if side <= MAX_RENDER_SIDE => Ok(side),
            _ => Err(GalleryError::BadRequest(format!(
                "Invalid size '{raw}', sides are limited to {MAX_RENDER_SIDE}"
            ))),
        }
    };

    Ok(Dimensions {
        width: parse(width)?,
        height: parse(height)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: Option<&str>) -> CreateGalleryReq {
        CreateGalleryReq {
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_create_gallery_ok() {
        let name = validate_create_gallery(&req(Some("trip"))).unwrap();
        assert_eq!(name.as_str(), "trip");
    }

    #[test]
    fn test_validate_create_gallery_missing_name() {
        let err = validate_create_gallery(&req(None)).unwrap_err();

        assert_eq!(err.status_code(), 400);
        let details = err.details().expect("validator error list");
        assert!(details.get("name").is_some());
    }

    #[test]
    fn test_validate_create_gallery_empty_name() {
        let err = validate_create_gallery(&req(Some(""))).unwrap_err();
        assert!(matches!(err, GalleryError::Validation { .. }));
    }

    #[test]
    fn test_validate_create_gallery_rejects_traversal() {
        for bad in ["..", "a/b", ".hidden"] {
            let err = validate_create_gallery(&req(Some(bad))).unwrap_err();
            assert_eq!(err.status_code(), 400, "{bad} should be rejected");
        }
    }

    #[test]
    fn test_existing_name_maps_invalid_to_not_found() {
        assert!(existing_name("Gallery", "trip").is_ok());
        let err = existing_name("Gallery", "..").unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(
            upload_file_name(Some("photo1.jpg")).unwrap().as_str(),
            "photo1.jpg"
        );
        assert_eq!(upload_file_name(None).unwrap_err().status_code(), 400);
        assert_eq!(
            upload_file_name(Some("../x.jpg")).unwrap_err().status_code(),
            400
        );
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(
            parse_dimensions("800x600").unwrap(),
            Dimensions {
                width: 800,
                height: 600
            }
        );
        assert_eq!(
            parse_dimensions("0x0").unwrap(),
            Dimensions {
                width: 0,
                height: 0
            }
        );
        assert_eq!(
            parse_dimensions("100x0").unwrap(),
            Dimensions {
                width: 100,
                height: 0
            }
        );
    }

    #[test]
    fn test_parse_dimensions_rejects_oversized_sides() {
        assert!(parse_dimensions(&format!("{MAX_RENDER_SIDE}x0")).is_ok());
        for bad in [
            "4294967295x4294967295",
            "60000x60000",
            "99999999999x1",
            "1x10001",
        ] {
            let err = parse_dimensions(bad).unwrap_err();
            assert_eq!(err.status_code(), 400, "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_dimensions_rejects_garbage() {
        for bad in ["", "100", "x100", "100x", "-1x10", "10x+5", "axb", "1x2x3"] {
            assert!(parse_dimensions(bad).is_err(), "{bad} should be rejected");
        }
    }
}

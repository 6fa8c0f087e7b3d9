//! Image renderer.
//!
//! Produces resized renditions of photos in their original format. Renditions live only in
//! memory for the duration of one request.
//!
//! ## Resize policy
//!
//! | requested | result |
//! |---|---|
//! | `0x0` | original size |
//! | `Wx0` | width `W`, height scaled to keep the aspect ratio |
//! | `0xH` | height `H`, width scaled to keep the aspect ratio |
//! | `WxH` | exactly `W`×`H`: scaled to cover, then centre-cropped |
//!
//! Scaled sides are rounded to the nearest pixel and never drop below 1. A resize whose working
//! buffer would exceed [`MAX_RENDER_PIXELS`] is refused before anything is allocated.

use crate::constants::MAX_RENDER_PIXELS;
use crate::{GalleryError, GalleryResult};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Requested bounding size; `0` leaves an axis unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An encoded image ready to be sent.
#[derive(Debug, Clone)]
pub struct Rendition {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Output size for an image of `original` size under the resize policy.
pub fn target_size(original: (u32, u32), requested: Dimensions) -> (u32, u32) {
    let (w, h) = original;
    match (requested.width, requested.height) {
        (0, 0) => (w, h),
        (tw, 0) => (tw, scale_side(h, tw, w)),
        (0, th) => (scale_side(w, th, h), th),
        (tw, th) => (tw, th),
    }
}

/// `side * num / den`, rounded, at least 1.
fn scale_side(side: u32, num: u32, den: u32) -> u32 {
    if den == 0 {
        return 1;
    }
    let scaled = (u64::from(side) * u64::from(num) + u64::from(den) / 2) / u64::from(den);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Pixels in the largest buffer the resize allocates.
///
/// `resize_to_fill` first scales to cover the box, so its intermediate image can be much larger
/// than the requested size when the aspect ratios differ.
fn working_pixels(original: (u32, u32), requested: Dimensions) -> u64 {
    let (w, h) = (u64::from(original.0.max(1)), u64::from(original.1.max(1)));
    let (tw, th) = target_size(original, requested);
    let (tw, th) = (u64::from(tw), u64::from(th));

    if requested.width == 0 || requested.height == 0 {
        return tw * th;
    }

    let (cw, ch) = if tw * h >= th * w {
        (tw, (h * tw).div_ceil(w))
    } else {
        ((w * th).div_ceil(h), th)
    };
    cw.saturating_mul(ch)
}

/// Refuses resizes that would allocate more than [`MAX_RENDER_PIXELS`].
///
/// # Errors
///
/// Returns `GalleryError::BadRequest` if the requested size is too large for this image.
pub fn check_render_size(original: (u32, u32), requested: Dimensions) -> GalleryResult<()> {
    if target_size(original, requested) == original {
        return Ok(());
    }

    if working_pixels(original, requested) > MAX_RENDER_PIXELS {
        return Err(GalleryError::BadRequest(format!(
            "Requested size {}x{} is too large for this image",
            requested.width, requested.height
        )));
    }
    Ok(())
}

/// Applies the resize policy to a decoded image.
pub fn resize(image: &DynamicImage, requested: Dimensions) -> DynamicImage {
    let (width, height) = target_size((image.width(), image.height()), requested);

    if (width, height) == (image.width(), image.height()) {
        return image.clone();
    }

    if requested.width > 0 && requested.height > 0 {
        image.resize_to_fill(width, height, FilterType::Lanczos3)
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }
}

/// Renders the image at `path` at the requested size, in the format its extension names.
///
/// The source is always fully decoded, so a truncated or corrupt file fails here instead of
/// being passed through.
///
/// # Errors
///
/// Returns `GalleryError` if:
/// - the file cannot be read (`Io`),
/// - the requested size is too large for the image (`BadRequest`),
/// - the image cannot be decoded or re-encoded (`Render`).
pub fn render(path: &Path, requested: Dimensions) -> GalleryResult<Rendition> {
    let bytes = std::fs::read(path)?;
    let source_format = image::guess_format(&bytes)?;
    let format = ImageFormat::from_path(path).unwrap_or(source_format);

    let decoded = image::load_from_memory_with_format(&bytes, source_format)?;
    check_render_size((decoded.width(), decoded.height()), requested)?;
    let resized = resize(&decoded, requested);
    let resized = match format {
        // The JPEG encoder only takes 8-bit gray or RGB.
        ImageFormat::Jpeg if !matches!(resized.color(), ColorType::L8 | ColorType::Rgb8) => {
            DynamicImage::ImageRgb8(resized.to_rgb8())
        }
        _ => resized,
    };

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, format)?;

    tracing::debug!(
        "rendered {} at {}x{} as {:?}",
        path.display(),
        resized.width(),
        resized.height(),
        format
    );

    Ok(Rendition {
        bytes: out.into_inner(),
        content_type: format.to_mime_type(),
        width: resized.width(),
        height: resized.height(),
    })
}

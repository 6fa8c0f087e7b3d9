//! Constants used throughout the gallery core crate.
//!
//! Default locations are relative to the working directory of the process, matching the layout
//! the service has always been deployed with: galleries in `gallery/`, scratch space in `files/`.

/// Default directory holding one sub-directory per gallery.
pub const DEFAULT_GALLERY_DIR: &str = "gallery";

/// Default directory where uploads are staged before being moved into a gallery.
pub const DEFAULT_UPLOAD_DIR: &str = "files/upload_image";

/// Default directory for temporary zip archives of galleries.
pub const DEFAULT_ARCHIVE_DIR: &str = "files/gallery_zip";

/// Default maximum size of an upload request body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Prefix of staged upload files.
pub const UPLOAD_TEMP_PREFIX: &str = "upload-";

/// Suffix of temporary archive files.
pub const ARCHIVE_TEMP_SUFFIX: &str = ".zip";

/// Message sent to clients for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Largest width or height accepted in a resize request.
pub const MAX_RENDER_SIDE: u32 = 10_000;

/// Largest pixel buffer a single resize may allocate (about 200 MB as RGBA).
pub const MAX_RENDER_PIXELS: u64 = 50_000_000;

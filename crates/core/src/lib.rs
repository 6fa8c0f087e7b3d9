//! # Gallery Core
//!
//! Core business logic for the gallery service.
//!
//! This crate contains the gallery operations and their collaborators:
//! - Startup configuration ([`CoreConfig`])
//! - The error taxonomy every operation reports with ([`GalleryError`])
//! - Input validation for names, bodies and size segments
//! - The image renderer (resized renditions) and the archive builder (gallery zips)
//! - [`GalleryService`], which ties them to the filesystem gateway in `gallery_files`
//!
//! **No API concerns**: HTTP routing, multipart parsing and response encoding belong in
//! `api-rest`.

pub mod archive;
pub mod config;
pub mod constants;
pub mod error;
pub mod gallery;
pub mod render;
pub mod validation;

pub use api_shared::pb;

pub use config::CoreConfig;
pub use constants::{DEFAULT_ARCHIVE_DIR, DEFAULT_GALLERY_DIR, DEFAULT_UPLOAD_DIR};
pub use error::{GalleryError, GalleryResult};
pub use gallery::GalleryService;
pub use render::{Dimensions, Rendition};

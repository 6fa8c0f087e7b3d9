//! Gallery File Storage
//!
//! This crate is the filesystem gateway for the gallery service: directory and file existence
//! checks, listing, creation, the no-clobber move of staged uploads, removal and modification
//! times. It carries no HTTP or business rules beyond what the filesystem itself enforces.
//!
//! ## Storage Layout
//!
//! ```text
//! <gallery_root>/
//! ├── trip/            # a gallery
//! │   ├── photo1.jpg   # a photo
//! │   └── photo2.png
//! └── family/
//! ```
//!
//! Only visible (non-dot) entries take part: hidden files and directories under the root or in
//! a gallery are ignored by every listing.
//!
//! ## Example Usage
//!
//! ```no_run
//! use gallery_files::GalleryStore;
//! use gallery_types::PathComponent;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = GalleryStore::new(Path::new("gallery"))?;
//! let trip = PathComponent::new("trip")?;
//!
//! store.create_gallery(&trip)?;
//! for photo in store.list_photos(&trip)? {
//!     println!("{} {}", photo.file_name, photo.modified);
//! }
//! # Ok(())
//! # }
//! ```

mod files;

pub use files::{GalleryEntry, GalleryStore, PhotoEntry};
pub use gallery_types::PathComponent;

/// Errors that can occur during gallery file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Gallery or photo does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Gallery or photo with this name already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Gallery still contains entries and cannot be removed
    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    /// Name is not a single safe path component
    #[error("Invalid name: {0}")]
    InvalidName(#[from] gallery_types::TextError),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Gallery directory gateway implementation
//!
//! This module provides [`GalleryStore`], the single place where gallery and photo names are
//! joined onto the configured root and turned into filesystem calls.
//!
//! # Atomicity
//!
//! Wherever the filesystem offers an atomic primitive it is used instead of an existence probe
//! followed by an action:
//!
//! - gallery creation is one `create_dir`; `AlreadyExists` from the OS is the conflict signal
//! - uploads are moved with `persist_noclobber`, which never replaces an existing file
//! - removals call `remove_dir`/`remove_file` directly and map `NotFound` from the OS
//!
//! Listings are a snapshot of `read_dir` at call time and are sorted by name.

use crate::{FilesError, PathComponent};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A gallery directory found under the root.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GalleryEntry {
    pub name: PathComponent,
}

/// A photo file found in a gallery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PhotoEntry {
    /// File name including extension
    pub file_name: PathComponent,

    /// Last modification time of the file
    pub modified: DateTime<Utc>,
}

/// Gateway over the gallery root directory
///
/// Every method takes validated [`PathComponent`] names, so paths built here can never leave
/// the root. The store holds no state beyond the root path and is cheap to clone.
#[derive(Debug, Clone)]
pub struct GalleryStore {
    /// Canonicalised gallery root
    root_directory: PathBuf,
}

impl GalleryStore {
    /// Creates a new `GalleryStore` over an existing root directory
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - the root directory does not exist or is not a directory
    /// - path canonicalisation fails
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Returns the canonicalised root directory
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Absolute path of a gallery directory (which may not exist)
    #[must_use]
    pub fn gallery_path(&self, gallery: &PathComponent) -> PathBuf {
        self.root_directory.join(gallery)
    }

    /// Absolute path of a photo file (which may not exist)
    #[must_use]
    pub fn photo_path(&self, gallery: &PathComponent, file_name: &PathComponent) -> PathBuf {
        self.gallery_path(gallery).join(file_name)
    }

    /// Whether `gallery` exists and is a directory
    pub fn gallery_exists(&self, gallery: &PathComponent) -> bool {
        self.gallery_path(gallery).is_dir()
    }

    /// Whether `file_name` exists in `gallery` and is a regular file
    pub fn photo_exists(&self, gallery: &PathComponent, file_name: &PathComponent) -> bool {
        self.photo_path(gallery, file_name).is_file()
    }

    /// Lists the galleries under the root, sorted by name
    ///
    /// Regular files, symlinks to non-directories, hidden entries and entries whose names are
    /// not valid UTF-8 are skipped.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the root cannot be read.
    pub fn list_galleries(&self) -> Result<Vec<GalleryEntry>, FilesError> {
        let mut galleries: Vec<GalleryEntry> = visible_entries(&self.root_directory)?
            .filter(|(path, _)| path.is_dir())
            .map(|(_, name)| GalleryEntry { name })
            .collect();

        galleries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(galleries)
    }

    /// Creates an empty gallery directory
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - an entry with this name already exists (`AlreadyExists`)
    /// - directory creation fails (`Io`)
    pub fn create_gallery(&self, gallery: &PathComponent) -> Result<(), FilesError> {
        let path = self.gallery_path(gallery);

        match fs::create_dir(&path) {
            Ok(()) => {
                tracing::debug!("created gallery directory {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(FilesError::AlreadyExists(gallery.to_string()))
            }
            Err(e) => Err(FilesError::Io(e)),
        }
    }

    /// Removes an empty gallery directory
    ///
    /// Removal is not recursive.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the gallery does not exist (`NotFound`)
    /// - the gallery still contains entries (`NotEmpty`)
    /// - removal fails for another reason (`Io`)
    pub fn remove_gallery(&self, gallery: &PathComponent) -> Result<(), FilesError> {
        let path = self.gallery_path(gallery);

        if path.exists() && !path.is_dir() {
            return Err(FilesError::NotFound(gallery.to_string()));
        }

        match fs::remove_dir(&path) {
            Ok(()) => {
                tracing::debug!("removed gallery directory {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FilesError::NotFound(gallery.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => {
                Err(FilesError::NotEmpty(gallery.to_string()))
            }
            Err(e) => Err(FilesError::Io(e)),
        }
    }

    /// Lists the photos in a gallery, sorted by file name
    ///
    /// Only regular, visible files are returned.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the gallery does not exist (`NotFound`)
    /// - the directory or an entry's metadata cannot be read (`Io`)
    pub fn list_photos(&self, gallery: &PathComponent) -> Result<Vec<PhotoEntry>, FilesError> {
        let dir = self.gallery_path(gallery);
        if !dir.is_dir() {
            return Err(FilesError::NotFound(gallery.to_string()));
        }

        let mut photos = Vec::new();
        for (path, file_name) in visible_entries(&dir)? {
            // Entries can disappear between read_dir and stat.
            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(FilesError::Io(e)),
            };
            if !metadata.is_file() {
                continue;
            }

            photos.push(PhotoEntry {
                file_name,
                modified: DateTime::<Utc>::from(metadata.modified()?),
            });
        }

        photos.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(photos)
    }

    /// Returns the entry for a single photo
    ///
    /// # Errors
    ///
    /// Returns `FilesError::NotFound` if the photo is missing or not a regular file.
    pub fn photo(
        &self,
        gallery: &PathComponent,
        file_name: &PathComponent,
    ) -> Result<PhotoEntry, FilesError> {
        let path = self.photo_path(gallery, file_name);
        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(FilesError::NotFound(format!("{gallery}/{file_name}"))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FilesError::NotFound(format!("{gallery}/{file_name}")))
            }
            Err(e) => return Err(FilesError::Io(e)),
        };

        Ok(PhotoEntry {
            file_name: file_name.clone(),
            modified: DateTime::<Utc>::from(metadata.modified()?),
        })
    }

    /// Moves a staged upload into a gallery under `file_name`
    ///
    /// The move never replaces an existing file. On every error path the staged file is
    /// dropped, which deletes it.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the gallery does not exist (`NotFound`)
    /// - a file with this name already exists in the gallery (`AlreadyExists`)
    /// - the move fails for another reason, e.g. staging on another filesystem (`Io`)
    pub fn store_photo(
        &self,
        gallery: &PathComponent,
        file_name: &PathComponent,
        staged: NamedTempFile,
    ) -> Result<PhotoEntry, FilesError> {
        if !self.gallery_exists(gallery) {
            return Err(FilesError::NotFound(gallery.to_string()));
        }

        let target = self.photo_path(gallery, file_name);
        match staged.persist_noclobber(&target) {
            Ok(_) => {
                tracing::debug!("stored photo {}", target.display());
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                return Err(FilesError::AlreadyExists(format!("{gallery}/{file_name}")));
            }
            Err(e) if e.error.kind() == ErrorKind::NotFound => {
                return Err(FilesError::NotFound(gallery.to_string()));
            }
            Err(e) => return Err(FilesError::Io(e.error)),
        }

        self.photo(gallery, file_name)
    }

    /// Deletes a photo from a gallery
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the photo does not exist or is not a regular file (`NotFound`)
    /// - removal fails for another reason (`Io`)
    pub fn remove_photo(
        &self,
        gallery: &PathComponent,
        file_name: &PathComponent,
    ) -> Result<(), FilesError> {
        let path = self.photo_path(gallery, file_name);

        if path.exists() && !path.is_file() {
            return Err(FilesError::NotFound(format!("{gallery}/{file_name}")));
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("removed photo {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FilesError::NotFound(format!("{gallery}/{file_name}")))
            }
            Err(e) => Err(FilesError::Io(e)),
        }
    }
}

/// Visible directory entries of `dir` whose names are valid path components
fn visible_entries(
    dir: &Path,
) -> Result<impl Iterator<Item = (PathBuf, PathComponent)>, FilesError> {
    let entries = fs::read_dir(dir)?;

    Ok(entries.flatten().filter_map(|entry| {
        let name = entry.file_name().into_string().ok()?;
        let name = PathComponent::new(name).ok()?;
        Some((entry.path(), name))
    }))
}

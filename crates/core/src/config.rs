//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables; request handling never does.

use crate::constants::DEFAULT_MAX_UPLOAD_BYTES;
use crate::{GalleryError, GalleryResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    gallery_dir: PathBuf,
    upload_dir: PathBuf,
    archive_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The gallery directory must already exist. The upload staging and archive directories are
    /// created if missing.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::InvalidConfig` if:
    /// - the gallery directory does not exist or is not a directory,
    /// - the staging or archive directory cannot be created.
    pub fn new(gallery_dir: PathBuf, upload_dir: PathBuf, archive_dir: PathBuf) -> GalleryResult<Self> {
        if !gallery_dir.is_dir() {
            return Err(GalleryError::InvalidConfig(format!(
                "gallery directory does not exist: {}",
                gallery_dir.display()
            )));
        }

        for dir in [&upload_dir, &archive_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                GalleryError::InvalidConfig(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        Ok(Self {
            gallery_dir,
            upload_dir,
            archive_dir,
        })
    }

    pub fn gallery_dir(&self) -> &Path {
        &self.gallery_dir
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }
}

/// Resolve a directory from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn dir_from_env_value(value: Option<String>, default: &str) -> PathBuf {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .into()
}

/// Parse the maximum upload size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 25 MiB.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> GalleryResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => match v.parse::<usize>() {
            Ok(0) | Err(_) => Err(GalleryError::InvalidConfig(format!(
                "max upload size must be a positive integer, got {v:?}"
            ))),
            Ok(n) => Ok(n),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_from_env_value() {
        assert_eq!(
            dir_from_env_value(None, "gallery"),
            PathBuf::from("gallery")
        );
        assert_eq!(
            dir_from_env_value(Some("  ".into()), "gallery"),
            PathBuf::from("gallery")
        );
        assert_eq!(
            dir_from_env_value(Some("/srv/photos".into()), "gallery"),
            PathBuf::from("/srv/photos")
        );
    }

    #[test]
    fn test_new_creates_scratch_dirs() {
        let temp = TempDir::new().unwrap();
        let gallery = temp.path().join("gallery");
        fs::create_dir(&gallery).unwrap();

        let cfg = CoreConfig::new(
            gallery.clone(),
            temp.path().join("files/upload_image"),
            temp.path().join("files/gallery_zip"),
        )
        .unwrap();

        assert_eq!(cfg.gallery_dir(), gallery.as_path());
        assert!(cfg.upload_dir().is_dir());
        assert!(cfg.archive_dir().is_dir());
    }

    #[test]
    fn test_new_requires_gallery_dir() {
        let temp = TempDir::new().unwrap();

        let result = CoreConfig::new(
            temp.path().join("missing"),
            temp.path().join("upload"),
            temp.path().join("zip"),
        );

        assert!(matches!(result, Err(GalleryError::InvalidConfig(_))));
    }

    #[test]
    fn test_max_upload_bytes_from_env_value() {
        assert_eq!(
            max_upload_bytes_from_env_value(None).unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        assert_eq!(
            max_upload_bytes_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        assert_eq!(
            max_upload_bytes_from_env_value(Some("1024".into())).unwrap(),
            1024
        );
        assert!(max_upload_bytes_from_env_value(Some("0".into())).is_err());
        assert!(max_upload_bytes_from_env_value(Some("lots".into())).is_err());
    }
}

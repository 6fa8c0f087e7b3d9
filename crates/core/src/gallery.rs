//! Gallery service.
//!
//! Orchestrates the filesystem gateway, the image renderer and the archive builder into the
//! operations the APIs expose. Every method takes raw names as they arrive from a client and
//! returns wire types from `api_shared`, or a [`GalleryError`] carrying the status to report.
//!
//! The service holds no state between calls; the gallery root on disk is the only source of
//! truth.

use crate::archive::build_archive;
use crate::config::CoreConfig;
use crate::constants::UPLOAD_TEMP_PREFIX;
use crate::render::{self, Dimensions, Rendition};
use crate::validation::{existing_name, upload_file_name, validate_create_gallery};
use crate::{GalleryError, GalleryResult};
use api_shared::{
    AckRes, CreateGalleryReq, GalleriesRes, GallerySummary, PhotoSummary, PhotosRes, UploadRes,
    UploadedPhoto,
};
use chrono::{DateTime, SecondsFormat, Utc};
use gallery_files::{FilesError, GalleryStore, PathComponent};
use gallery_types::encode_uri;
use std::sync::Arc;
use tempfile::NamedTempFile;

const GALLERY: &str = "Gallery";
const PHOTO: &str = "Photo";

/// Service for galleries and the photos inside them.
#[derive(Clone, Debug)]
pub struct GalleryService {
    cfg: Arc<CoreConfig>,
    store: GalleryStore,
}

impl GalleryService {
    /// Creates a new `GalleryService` over the configured gallery root.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::InvalidConfig` if the gallery root is not a readable directory.
    pub fn new(cfg: Arc<CoreConfig>) -> GalleryResult<Self> {
        let store = GalleryStore::new(cfg.gallery_dir())
            .map_err(|e| GalleryError::InvalidConfig(e.to_string()))?;

        Ok(Self { cfg, store })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Lists every gallery under the root, sorted by name.
    pub fn list_galleries(&self) -> GalleryResult<GalleriesRes> {
        tracing::info!("Preparing galleries info");

        let galleries = self
            .store
            .list_galleries()?
            .into_iter()
            .map(|g| gallery_summary(&g.name))
            .collect();

        Ok(GalleriesRes { galleries })
    }

    /// Creates a new, empty gallery.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if:
    /// - the request body is invalid (`Validation`, 400),
    /// - a gallery with this name already exists (`Conflict`, 409).
    pub fn create_gallery(&self, req: &CreateGalleryReq) -> GalleryResult<GallerySummary> {
        let name = validate_create_gallery(req)?;

        self.store.create_gallery(&name).map_err(|e| match e {
            FilesError::AlreadyExists(_) => {
                GalleryError::Conflict("Gallery with this name already exists".into())
            }
            other => other.into(),
        })?;

        tracing::info!("Created gallery {}", name);
        Ok(GallerySummary {
            path: name.to_string(),
            name: name.to_string(),
        })
    }

    /// Resolves an existing gallery.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::NotFound` if the gallery does not exist.
    pub fn require_gallery(&self, gallery: &str) -> GalleryResult<PathComponent> {
        let name = existing_name(GALLERY, gallery)?;
        if !self.store.gallery_exists(&name) {
            return Err(not_found(GALLERY));
        }
        Ok(name)
    }

    /// Removes an empty gallery.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if:
    /// - the gallery does not exist (`NotFound`, 404),
    /// - the gallery still contains photos (`Conflict`, 409).
    pub fn delete_gallery(&self, gallery: &str) -> GalleryResult<AckRes> {
        let name = existing_name(GALLERY, gallery)?;

        self.store.remove_gallery(&name).map_err(|e| match e {
            FilesError::NotFound(_) => not_found(GALLERY),
            FilesError::NotEmpty(_) => GalleryError::Conflict("Gallery is not empty".into()),
            other => other.into(),
        })?;

        tracing::info!("Deleted gallery {}", name);
        Ok(AckRes::success("Gallery was deleted"))
    }

    /// Lists the photos of one gallery, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::NotFound` if the gallery does not exist.
    pub fn list_photos(&self, gallery: &str) -> GalleryResult<PhotosRes> {
        let name = existing_name(GALLERY, gallery)?;
        tracing::info!("Preparing photos info for {}", name);

        let photos = self.store.list_photos(&name).map_err(|e| match e {
            FilesError::NotFound(_) => not_found(GALLERY),
            other => other.into(),
        })?;

        let path = encode_uri(name.as_str());
        let images = photos
            .into_iter()
            .map(|photo| PhotoSummary {
                path: path.clone(),
                fullpath: format!("{}/{}", name, photo.file_name),
                name: photo.file_name.stem().to_string(),
                modified: iso_timestamp(photo.modified),
            })
            .collect();

        Ok(PhotosRes {
            gallery: gallery_summary(&name),
            images,
        })
    }

    /// Creates a new staging file for an incoming upload.
    ///
    /// The file is removed when the returned handle is dropped, unless it is moved into a
    /// gallery by [`Self::upload_photo`].
    pub fn staging_file(&self) -> GalleryResult<NamedTempFile> {
        Ok(tempfile::Builder::new()
            .prefix(UPLOAD_TEMP_PREFIX)
            .tempfile_in(self.cfg.upload_dir())?)
    }

    /// Moves a staged upload into a gallery under its original file name.
    ///
    /// An existing file is never overwritten. The staged file is deleted on every failure.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if:
    /// - the gallery does not exist (`NotFound`, 404),
    /// - the file name is missing or unsafe (`BadRequest`, 400),
    /// - a file with this name already exists (`Conflict`, 409).
    pub fn upload_photo(
        &self,
        gallery: &str,
        file_name: Option<&str>,
        staged: NamedTempFile,
    ) -> GalleryResult<UploadRes> {
        let gallery = self.require_gallery(gallery)?;
        let file_name = upload_file_name(file_name)?;

        tracing::info!("Saving file {}/{}", gallery, file_name);
        let entry = self
            .store
            .store_photo(&gallery, &file_name, staged)
            .map_err(|e| match e {
                FilesError::AlreadyExists(_) => {
                    GalleryError::Conflict("File with this name already exists".into())
                }
                FilesError::NotFound(_) => not_found(GALLERY),
                other => other.into(),
            })?;

        Ok(UploadRes {
            uploaded: vec![UploadedPhoto {
                path: file_name.to_string(),
                full_path: format!("{}/{}", gallery, file_name),
                name: file_name.stem().to_string(),
                modified: iso_timestamp(entry.modified),
            }],
        })
    }

    /// Deletes one photo.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::NotFound` if the gallery or the photo does not exist.
    pub fn delete_photo(&self, gallery: &str, image: &str) -> GalleryResult<AckRes> {
        let gallery = self.require_gallery(gallery)?;
        let image = existing_name(PHOTO, image)?;

        self.store.remove_photo(&gallery, &image).map_err(|e| match e {
            FilesError::NotFound(_) => not_found(PHOTO),
            other => other.into(),
        })?;

        tracing::info!("Deleted image {}/{}", gallery, image);
        Ok(AckRes::success("Photo was deleted"))
    }

    /// Deletes a photo when `image` is given, otherwise the (empty) gallery.
    pub fn delete(&self, gallery: &str, image: Option<&str>) -> GalleryResult<AckRes> {
        match image {
            Some(image) => self.delete_photo(gallery, image),
            None => self.delete_gallery(gallery),
        }
    }

    /// Renders a resized copy of one photo.
    ///
    /// Blocking and CPU-bound; async callers should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if:
    /// - the gallery or photo does not exist (`NotFound`, 404),
    /// - decoding, resizing or encoding fails (`Render`, 500).
    pub fn resized_image(
        &self,
        gallery: &str,
        image: &str,
        size: Dimensions,
    ) -> GalleryResult<Rendition> {
        let gallery = existing_name(GALLERY, gallery)?;
        let image = existing_name(PHOTO, image)?;

        if !self.store.photo_exists(&gallery, &image) {
            return Err(not_found(PHOTO));
        }

        tracing::info!(
            "Preparing preview of {}/{} at {}x{}",
            gallery,
            image,
            size.width,
            size.height
        );
        render::render(&self.store.photo_path(&gallery, &image), size)
    }

    /// Builds a zip archive of a gallery's current contents.
    ///
    /// The archive is deleted when the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if:
    /// - the gallery does not exist (`NotFound`, 404),
    /// - the archive cannot be written (`Archive`/`Io`, 500).
    pub fn download_gallery(&self, gallery: &str) -> GalleryResult<NamedTempFile> {
        let gallery = self.require_gallery(gallery)?;

        tracing::info!("Compressing gallery {}", gallery);
        build_archive(&self.store.gallery_path(&gallery), self.cfg.archive_dir())
    }
}

fn gallery_summary(name: &PathComponent) -> GallerySummary {
    GallerySummary {
        path: encode_uri(name.as_str()),
        name: name.to_string(),
    }
}

fn not_found(kind: &str) -> GalleryError {
    GalleryError::NotFound(format!("{kind} not found"))
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T10:00:00.000Z`.
fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_service() -> (TempDir, GalleryService) {
        let temp = TempDir::new().unwrap();
        let gallery_dir = temp.path().join("gallery");
        fs::create_dir(&gallery_dir).unwrap();

        let cfg = CoreConfig::new(
            gallery_dir,
            temp.path().join("files/upload_image"),
            temp.path().join("files/gallery_zip"),
        )
        .unwrap();

        let service = GalleryService::new(Arc::new(cfg)).unwrap();
        (temp, service)
    }

    fn create(service: &GalleryService, name: &str) {
        service
            .create_gallery(&CreateGalleryReq {
                name: Some(name.into()),
            })
            .unwrap();
    }

    fn stage(service: &GalleryService, content: &[u8]) -> NamedTempFile {
        let mut staged = service.staging_file().unwrap();
        staged.write_all(content).unwrap();
        staged
    }

    fn dir_is_empty(path: &std::path::Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn test_create_then_list_contains_gallery_once() {
        let (_temp, service) = create_service();

        create(&service, "trip");
        create(&service, "Summer 2024");

        let res = service.list_galleries().unwrap();
        let trips: Vec<_> = res.galleries.iter().filter(|g| g.name == "trip").collect();
        assert_eq!(trips.len(), 1);

        let summer = res
            .galleries
            .iter()
            .find(|g| g.name == "Summer 2024")
            .unwrap();
        assert_eq!(summer.path, "Summer%202024");
    }

    #[test]
    fn test_create_duplicate_gallery_conflicts() {
        let (_temp, service) = create_service();
        create(&service, "trip");

        let err = service
            .create_gallery(&CreateGalleryReq {
                name: Some("trip".into()),
            })
            .unwrap_err();

        assert_eq!(err.status_code(), 409);
        assert_eq!(service.list_galleries().unwrap().galleries.len(), 1);
    }

    #[test]
    fn test_create_invalid_gallery_creates_nothing() {
        let (_temp, service) = create_service();

        for name in [None, Some(String::new()), Some("../escape".to_string())] {
            let err = service.create_gallery(&CreateGalleryReq { name }).unwrap_err();
            assert_eq!(err.status_code(), 400);
        }

        assert!(service.list_galleries().unwrap().galleries.is_empty());
        assert!(dir_is_empty(service.config().gallery_dir()));
    }

    #[test]
    fn test_upload_to_missing_gallery_leaves_no_temp_files() {
        let (_temp, service) = create_service();

        let staged = stage(&service, b"jpeg");
        let err = service
            .upload_photo("missing", Some("photo1.jpg"), staged)
            .unwrap_err();

        assert_eq!(err.status_code(), 404);
        assert!(dir_is_empty(service.config().upload_dir()));
    }

    #[test]
    fn test_upload_conflict_keeps_original() {
        let (_temp, service) = create_service();
        create(&service, "trip");
        service
            .upload_photo("trip", Some("photo1.jpg"), stage(&service, b"original"))
            .unwrap();

        let err = service
            .upload_photo("trip", Some("photo1.jpg"), stage(&service, b"replacement"))
            .unwrap_err();

        assert_eq!(err.status_code(), 409);
        let stored = service.config().gallery_dir().join("trip/photo1.jpg");
        assert_eq!(fs::read(stored).unwrap(), b"original");
        assert!(dir_is_empty(service.config().upload_dir()));
    }

    #[test]
    fn test_upload_then_list_photos() {
        let (_temp, service) = create_service();
        create(&service, "trip");

        let before = Utc::now() - chrono::Duration::seconds(2);
        let uploaded = service
            .upload_photo("trip", Some("photo1.jpg"), stage(&service, b"jpeg"))
            .unwrap();

        assert_eq!(uploaded.uploaded[0].path, "photo1.jpg");
        assert_eq!(uploaded.uploaded[0].full_path, "trip/photo1.jpg");
        assert_eq!(uploaded.uploaded[0].name, "photo1");

        let listed = service.list_photos("trip").unwrap();
        assert_eq!(listed.gallery.name, "trip");
        assert_eq!(listed.images.len(), 1);
        assert_eq!(listed.images[0].fullpath, "trip/photo1.jpg");
        assert_eq!(listed.images[0].name, "photo1");

        let modified = DateTime::parse_from_rfc3339(&listed.images[0].modified)
            .unwrap()
            .with_timezone(&Utc);
        assert!(modified >= before);
        assert!(listed.images[0].modified.ends_with('Z'));
    }

    #[test]
    fn test_upload_without_file_name_is_bad_request() {
        let (_temp, service) = create_service();
        create(&service, "trip");

        let err = service
            .upload_photo("trip", None, stage(&service, b"x"))
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(dir_is_empty(service.config().upload_dir()));
    }

    #[test]
    fn test_delete_photo_and_gallery() {
        let (_temp, service) = create_service();
        create(&service, "trip");
        service
            .upload_photo("trip", Some("photo1.jpg"), stage(&service, b"x"))
            .unwrap();

        assert_eq!(
            service.delete("trip", None).unwrap_err().status_code(),
            409
        );

        service.delete("trip", Some("photo1.jpg")).unwrap();
        assert!(service.list_photos("trip").unwrap().images.is_empty());

        service.delete("trip", None).unwrap();
        assert!(service.list_galleries().unwrap().galleries.is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_temp, service) = create_service();
        create(&service, "trip");

        assert_eq!(
            service.delete_photo("trip", "nope.jpg").unwrap_err().status_code(),
            404
        );
        assert_eq!(
            service.delete_photo("nope", "a.jpg").unwrap_err().status_code(),
            404
        );
        assert_eq!(service.delete_gallery("nope").unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_list_photos_missing_gallery() {
        let (_temp, service) = create_service();

        let err = service.list_photos("nope").unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.public_message(), "Gallery not found");
    }

    #[test]
    fn test_resized_image() {
        let (_temp, service) = create_service();
        create(&service, "trip");
        RgbImage::from_pixel(200, 100, Rgb([10, 20, 30]))
            .save(service.config().gallery_dir().join("trip/photo1.png"))
            .unwrap();

        let rendition = service
            .resized_image(
                "trip",
                "photo1.png",
                Dimensions {
                    width: 100,
                    height: 0,
                },
            )
            .unwrap();

        assert_eq!((rendition.width, rendition.height), (100, 50));
        assert_eq!(rendition.content_type, "image/png");

        let err = service
            .resized_image("trip", "missing.png", Dimensions::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_download_gallery() {
        let (_temp, service) = create_service();
        create(&service, "trip");
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            service
                .upload_photo("trip", Some(name), stage(&service, name.as_bytes()))
                .unwrap();
        }

        let archive = service.download_gallery("trip").unwrap();
        let zip = zip::ZipArchive::new(fs::File::open(archive.path()).unwrap()).unwrap();
        assert_eq!(zip.len(), 3);

        drop(archive);
        assert!(dir_is_empty(service.config().archive_dir()));

        assert_eq!(
            service.download_gallery("nope").unwrap_err().status_code(),
            404
        );
    }
}

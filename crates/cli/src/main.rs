use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use api_shared::CreateGalleryReq;
use clap::{Parser, Subcommand};
use gallery_core::config::dir_from_env_value;
use gallery_core::validation::parse_dimensions;
use gallery_core::{
    CoreConfig, GalleryError, GalleryResult, GalleryService, DEFAULT_ARCHIVE_DIR,
    DEFAULT_GALLERY_DIR, DEFAULT_UPLOAD_DIR,
};

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Gallery administration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all galleries
    List,
    /// Create an empty gallery
    Create {
        /// Gallery name
        name: String,
    },
    /// List the photos of a gallery
    Photos {
        /// Gallery name
        gallery: String,
    },
    /// Add a local image file to a gallery
    Add {
        /// Gallery name
        gallery: String,
        /// Path of the file to add; its file name is kept
        file: PathBuf,
    },
    /// Delete a photo, or an empty gallery when no image is given
    Delete {
        /// Gallery name
        gallery: String,
        /// Photo file name
        image: Option<String>,
    },
    /// Write a resized copy of a photo
    Resize {
        /// Target size as <width>x<height>, 0 leaves an axis unconstrained
        size: String,
        /// Gallery name
        gallery: String,
        /// Photo file name
        image: String,
        /// Output file
        out: PathBuf,
    },
    /// Write a zip archive of a gallery
    Archive {
        /// Gallery name
        gallery: String,
        /// Output file
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match service().and_then(|service| run(&service, cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn service() -> GalleryResult<GalleryService> {
    let cfg = CoreConfig::new(
        dir_from_env_value(std::env::var("GALLERY_DIR").ok(), DEFAULT_GALLERY_DIR),
        dir_from_env_value(std::env::var("GALLERY_UPLOAD_DIR").ok(), DEFAULT_UPLOAD_DIR),
        dir_from_env_value(std::env::var("GALLERY_ARCHIVE_DIR").ok(), DEFAULT_ARCHIVE_DIR),
    )?;
    GalleryService::new(Arc::new(cfg))
}

fn run(service: &GalleryService, command: Commands) -> GalleryResult<()> {
    match command {
        Commands::List => {
            let galleries = service.list_galleries()?.galleries;
            if galleries.is_empty() {
                println!("No galleries found.");
            }
            for gallery in galleries {
                println!("{}", gallery.name);
            }
        }
        Commands::Create { name } => {
            let created = service.create_gallery(&CreateGalleryReq { name: Some(name) })?;
            println!("Created gallery: {}", created.name);
        }
        Commands::Photos { gallery } => {
            let photos = service.list_photos(&gallery)?;
            if photos.images.is_empty() {
                println!("No photos in {}.", photos.gallery.name);
            }
            for photo in photos.images {
                println!("{}  {}", photo.modified, photo.fullpath);
            }
        }
        Commands::Add { gallery, file } => {
            let uploaded = add_file(service, &gallery, &file)?;
            for photo in uploaded.uploaded {
                println!("Added {}", photo.full_path);
            }
        }
        Commands::Delete { gallery, image } => {
            let ack = service.delete(&gallery, image.as_deref())?;
            println!("{}", ack.message);
        }
        Commands::Resize {
            size,
            gallery,
            image,
            out,
        } => {
            let rendition = service.resized_image(&gallery, &image, parse_dimensions(&size)?)?;
            fs::write(&out, &rendition.bytes)?;
            println!(
                "Wrote {}x{} {} to {}",
                rendition.width,
                rendition.height,
                rendition.content_type,
                out.display()
            );
        }
        Commands::Archive { gallery, out } => {
            let archive = service.download_gallery(&gallery)?;
            fs::copy(archive.path(), &out)?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}

/// Copies a local file into staging and moves it into the gallery.
fn add_file(
    service: &GalleryService,
    gallery: &str,
    file: &Path,
) -> GalleryResult<api_shared::UploadRes> {
    service.require_gallery(gallery)?;

    let file_name = file.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        GalleryError::BadRequest(format!("not a file name: {}", file.display()))
    })?;

    let mut staged = service.staging_file()?;
    io::copy(&mut File::open(file)?, staged.as_file_mut())?;

    service.upload_photo(gallery, Some(file_name), staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_service() -> (TempDir, GalleryService) {
        let temp = TempDir::new().unwrap();
        let gallery_dir = temp.path().join("gallery");
        fs::create_dir(&gallery_dir).unwrap();

        let cfg = CoreConfig::new(
            gallery_dir,
            temp.path().join("upload"),
            temp.path().join("archive"),
        )
        .unwrap();
        let service = GalleryService::new(Arc::new(cfg)).unwrap();
        (temp, service)
    }

    #[test]
    fn test_cli_parses_delete_without_image() {
        let cli = Cli::try_parse_from(["gallery", "delete", "trip"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Delete { ref gallery, image: None } if gallery == "trip"
        ));
    }

    #[test]
    fn test_add_file_keeps_name() {
        let (temp, service) = create_service();
        run(&service, Commands::Create { name: "trip".into() }).unwrap();

        let local = temp.path().join("photo1.jpg");
        fs::write(&local, b"jpeg bytes").unwrap();

        let uploaded = add_file(&service, "trip", &local).unwrap();

        assert_eq!(uploaded.uploaded[0].full_path, "trip/photo1.jpg");
        let stored = fs::read(temp.path().join("gallery/trip/photo1.jpg")).unwrap();
        assert_eq!(stored, b"jpeg bytes");
    }

    #[test]
    fn test_add_file_missing_gallery() {
        let (temp, service) = create_service();
        let local = temp.path().join("photo1.jpg");
        fs::write(&local, b"x").unwrap();

        let err = add_file(&service, "nope", &local).unwrap_err();
        assert!(matches!(err, GalleryError::NotFound(_)));
    }

    #[test]
    fn test_archive_writes_output() {
        let (temp, service) = create_service();
        run(&service, Commands::Create { name: "trip".into() }).unwrap();
        let out = temp.path().join("trip.zip");

        run(
            &service,
            Commands::Archive {
                gallery: "trip".into(),
                out: out.clone(),
            },
        )
        .unwrap();

        assert!(out.is_file());
        assert_eq!(fs::read_dir(temp.path().join("archive")).unwrap().count(), 0);
    }
}

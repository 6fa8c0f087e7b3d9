//! Archive builder.
//!
//! Zips the current contents of one gallery into a uniquely named temporary file. The returned
//! [`NamedTempFile`] owns the file on disk: dropping it (or the [`tempfile::TempPath`] taken from
//! it) deletes the archive, which is how callers guarantee cleanup on every exit path.

use crate::constants::ARCHIVE_TEMP_SUFFIX;
use crate::GalleryResult;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds a zip of the regular, visible files directly inside `source_dir`.
///
/// Entries are added in name order and named after the files. Sub-directories and hidden files
/// are not included. The archive is written to a new temporary file in `archive_dir`; on error
/// the partial file is removed.
///
/// # Errors
///
/// Returns `GalleryError` if:
/// - `source_dir` cannot be read or a file cannot be opened (`Io`),
/// - the temporary file cannot be created (`Io`),
/// - writing the zip fails (`Archive`).
pub fn build_archive(source_dir: &Path, archive_dir: &Path) -> GalleryResult<NamedTempFile> {
    let mut files = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') || !entry.path().is_file() {
            continue;
        }
        files.push((name, entry.path()));
    }
    files.sort();

    let archive = tempfile::Builder::new()
        .suffix(ARCHIVE_TEMP_SUFFIX)
        .tempfile_in(archive_dir)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(archive.as_file());

    for (name, path) in &files {
        zip.start_file(name.as_str(), options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;

    tracing::debug!(
        "archived {} files from {} into {}",
        files.len(),
        source_dir.display(),
        archive.path().display()
    );

    Ok(archive)
}

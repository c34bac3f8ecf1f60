//! Packing bundle directories into artifacts and unpacking restore input.

use crate::error::{BackupError, Result};
use chrono::{Local, NaiveDate};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Packs a directory tree into a single artifact and back.
pub trait Archiver {
    /// Compress `source_dir` into `output`. Entry names are relative to
    /// `source_dir`. A partial artifact is removed on error.
    fn pack(&self, source_dir: &Path, output: &Path) -> Result<PathBuf>;

    /// Extract `archive` into `destination`.
    fn unpack(&self, archive: &Path, destination: &Path) -> Result<()>;
}

/// Zip archiver. Also unpacks `.tar.gz` and `.tgz` input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn pack(&self, source_dir: &Path, output: &Path) -> Result<PathBuf> {
        if let Err(e) = write_zip(source_dir, output) {
            if output.exists() {
                let _ = fs::remove_file(output);
            }
            return Err(e);
        }
        Ok(output.to_path_buf())
    }

    fn unpack(&self, archive: &Path, destination: &Path) -> Result<()> {
        let filename = archive
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        fs::create_dir_all(destination)?;

        if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
            extract_tar_gz(archive, destination)
        } else {
            extract_zip(archive, destination)
        }
    }
}

fn write_zip(source_dir: &Path, output: &Path) -> Result<()> {
    let mut zip = zip::ZipWriter::new(BufWriter::new(File::create(output)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path == output {
            continue;
        }

        let relative = path.strip_prefix(source_dir).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            io::copy(&mut File::open(path)?, &mut zip)?;
        }
    }

    zip.finish()?.flush()?;
    Ok(())
}

/// Zip entry names always use forward slashes.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| BackupError::InvalidArchive {
        path: archive_path.to_path_buf(),
        message: format!("Failed to open zip: {}", e),
    })?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        let outpath = match file.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => continue,
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, target_dir: &Path) -> Result<()> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    archive
        .unpack(target_dir)
        .map_err(|e| BackupError::InvalidArchive {
            path: archive_path.to_path_buf(),
            message: format!("Failed to extract tar.gz: {}", e),
        })
}

/// Path of today's dated artifact for a bundle directory: `{dir}_{YYYY-MM-DD}.zip`.
pub fn dated_artifact_path(dir: &Path) -> PathBuf {
    dated_artifact_path_on(dir, Local::now().date_naive())
}

pub fn dated_artifact_path_on(dir: &Path, date: NaiveDate) -> PathBuf {
    let mut name = dir.as_os_str().to_os_string();
    name.push(format!("_{}.zip", date.format(DATE_FORMAT)));
    PathBuf::from(name)
}

/// Whether `file_name` is a dated artifact of repository `repo`.
pub fn is_dated_artifact(file_name: &str, repo: &str) -> bool {
    file_name
        .strip_prefix(repo)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".zip"))
        .is_some_and(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).is_ok())
}

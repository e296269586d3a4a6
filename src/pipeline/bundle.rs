//! Final packaging of a card folder.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::BundleMode;

use super::DownloadError;

/// Apply `mode` to the populated folder `dir` and return where the result is.
///
/// `Folder` leaves everything in place. `Zip` compresses the folder into
/// `{dir}.zip` and removes the folder once the archive is complete.
pub async fn package(dir: &Path, mode: BundleMode) -> Result<PathBuf, DownloadError> {
    match mode {
        BundleMode::Folder => Ok(dir.to_path_buf()),
        BundleMode::Zip => {
            let dir = dir.to_path_buf();
            tokio::task::spawn_blocking(move || create_archive(&dir))
                .await
                .map_err(|e| DownloadError::Worker(e.to_string()))?
        }
    }
}

/// Path of the archive built from `dir`
pub fn archive_path(dir: &Path) -> PathBuf {
    let mut name = dir.as_os_str().to_owned();
    name.push(".zip");
    PathBuf::from(name)
}

fn partial_path(dir: &Path) -> PathBuf {
    let mut name = dir.as_os_str().to_owned();
    name.push(".zip.part");
    PathBuf::from(name)
}

/// Zip every file under `dir` into `{dir}.zip`, then delete `dir`.
///
/// Entries are stored flat under their file names, in name order. When two
/// files share a name the shallower one is kept and the other is skipped. The
/// archive is finished under a `.part` name and renamed into place before
/// anything is deleted.
pub fn create_archive(dir: &Path) -> Result<PathBuf, DownloadError> {
    let target = archive_path(dir);
    let partial = partial_path(dir);

    if let Err(e) = write_archive(dir, &partial) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    std::fs::rename(&partial, &target).map_err(|e| DownloadError::filesystem(&target, e))?;
    std::fs::remove_dir_all(dir).map_err(|e| DownloadError::filesystem(dir, e))?;

    tracing::info!(archive = %target.display(), "created zip bundle");
    Ok(target)
}

fn write_archive(dir: &Path, partial: &Path) -> Result<(), DownloadError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| DownloadError::Archive(e.to_string()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| {
        a.file_name()
            .cmp(&b.file_name())
            .then_with(|| a.components().count().cmp(&b.components().count()))
            .then_with(|| a.cmp(b))
    });

    let file = File::create(partial).map_err(|e| DownloadError::filesystem(partial, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names = HashSet::new();
    for path in &files {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if !names.insert(name.clone()) {
            tracing::warn!(
                path = %path.display(),
                entry = %name,
                "duplicate archive entry skipped"
            );
            continue;
        }
        let bytes = std::fs::read(path).map_err(|e| DownloadError::filesystem(path, e))?;

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| DownloadError::Archive(e.to_string()))?;
        writer
            .write_all(&bytes)
            .map_err(|e| DownloadError::Archive(e.to_string()))?;
        tracing::debug!(entry = %name, bytes = bytes.len(), "added to archive");
    }

    let mut file = writer
        .finish()
        .map_err(|e| DownloadError::Archive(e.to_string()))?;
    file.flush()
        .map_err(|e| DownloadError::filesystem(partial, e))?;
    Ok(())
}

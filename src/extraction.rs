//! Archive extraction
//!
//! Workers hand each dequeued archive to [`process_archive`], which waits for
//! the writer to release the file, unpacks the full contents into
//! `<destination_dir>/<archive stem>/`, and optionally deletes the source.
//!
//! Failures never propagate to the worker loop: extraction is all-or-nothing
//! from the caller's perspective, a failed archive is logged and left in the
//! source folder, and the worker moves on to its next item.

use crate::config::Config;
use crate::error::{ExtractionError, Result};
use crate::file_lock;
use crate::queue::WorkQueue;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of processing a single archive
///
/// Errors are already logged by the time the caller sees this; the outcome
/// exists for observability and tests, not for control flow.
#[derive(Debug)]
pub enum ExtractOutcome {
    /// Extraction succeeded (and the source was deleted if configured)
    Extracted {
        /// Number of files written to the destination
        extracted_files: usize,
    },
    /// Extraction succeeded but the requested source deletion failed
    ///
    /// A distinct partial-success state: the destination tree is complete and
    /// usable, only the cleanup of the source archive failed.
    DeleteFailed {
        /// Number of files written to the destination
        extracted_files: usize,
    },
    /// Extraction failed; the source archive is left in place
    Failed(ExtractionError),
    /// Cancellation fired while waiting for the file to be released
    Cancelled,
}

/// Compute the destination directory for an archive
///
/// `name.zip` extracts into `<destination_dir>/name/`.
fn destination_dir(archive_path: &Path, destination_root: &Path) -> Result<PathBuf> {
    let stem = archive_path
        .file_stem()
        .ok_or_else(|| ExtractionError::BadArchiveName {
            archive: archive_path.to_path_buf(),
        })?;
    Ok(destination_root.join(stem))
}

/// Extract a single ZIP entry to disk, creating directories as needed
fn extract_zip_entry(
    mut file: zip::read::ZipFile,
    dest_dir: &Path,
    archive_path: &Path,
) -> Result<Option<PathBuf>> {
    let file_path = match file.enclosed_name() {
        Some(path) => dest_dir.join(path),
        None => {
            warn!(archive = %archive_path.display(), "skipping entry with unsafe path");
            return Ok(None);
        }
    };

    if file.is_dir() {
        std::fs::create_dir_all(&file_path).map_err(|e| ExtractionError::EntryFailed {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to create directory: {e}"),
        })?;
        return Ok(None);
    }

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExtractionError::EntryFailed {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to create parent directories: {e}"),
        })?;
    }

    let mut outfile =
        std::fs::File::create(&file_path).map_err(|e| ExtractionError::EntryFailed {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to create output file: {e}"),
        })?;

    std::io::copy(&mut file, &mut outfile).map_err(|e| ExtractionError::EntryFailed {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to write entry: {e}"),
    })?;

    Ok(Some(file_path))
}

/// Extract the full contents of a ZIP archive into `dest_dir`
///
/// Creates the destination directory if absent. Synchronous: callers in async
/// context run this on a blocking task.
pub fn try_extract(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    debug!(
        archive = %archive_path.display(),
        dest = %dest_dir.display(),
        "attempting ZIP extraction"
    );

    std::fs::create_dir_all(dest_dir).map_err(|e| ExtractionError::OpenFailed {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to create destination: {e}"),
    })?;

    let file = std::fs::File::open(archive_path).map_err(|e| ExtractionError::OpenFailed {
        archive: archive_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ExtractionError::InvalidArchive {
            archive: archive_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractionError::EntryFailed {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to read ZIP entry: {e}"),
            })?;

        if let Some(file_path) = extract_zip_entry(entry, dest_dir, archive_path)? {
            extracted_files.push(file_path);
        }
    }

    debug!(
        archive = %archive_path.display(),
        extracted_count = extracted_files.len(),
        "ZIP extraction successful"
    );

    Ok(extracted_files)
}

/// Process one dequeued archive to completion
///
/// Waits for the writer to release the file (cancellation point, polling at
/// `config.poll_interval`), extracts on a blocking task, then deletes the
/// source if `delete_after_extract` is set. Deletion is attempted only after a
/// fully successful extraction. All failures are logged here and swallowed.
pub async fn process_archive(
    archive_path: &Path,
    queue: &WorkQueue,
    config: &Config,
    cancel: &CancellationToken,
) -> ExtractOutcome {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.display().to_string());

    let dest_dir = match destination_dir(archive_path, &config.destination_dir) {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to unzip {name}. Reason: {e}");
            return match e {
                crate::error::Error::Extraction(inner) => ExtractOutcome::Failed(inner),
                other => ExtractOutcome::Failed(ExtractionError::OpenFailed {
                    archive: archive_path.to_path_buf(),
                    reason: other.to_string(),
                }),
            };
        }
    };

    if !file_lock::wait_until_unlocked(archive_path, config.poll_interval, cancel).await {
        debug!(archive = %archive_path.display(), "cancelled while waiting for file lock");
        return ExtractOutcome::Cancelled;
    }

    // Past this point cancellation no longer applies: the extraction itself is
    // not interruptible and runs to completion even during shutdown.
    let extracted = {
        let archive_path = archive_path.to_path_buf();
        let dest_dir = dest_dir.clone();
        tokio::task::spawn_blocking(move || try_extract(&archive_path, &dest_dir)).await
    };

    let extracted_files = match extracted {
        Ok(Ok(files)) => files.len(),
        Ok(Err(e)) => {
            error!("Failed to unzip {name}. Reason: {e}");
            return match e {
                crate::error::Error::Extraction(inner) => ExtractOutcome::Failed(inner),
                other => ExtractOutcome::Failed(ExtractionError::OpenFailed {
                    archive: archive_path.to_path_buf(),
                    reason: other.to_string(),
                }),
            };
        }
        Err(join_err) => {
            let e = ExtractionError::TaskFailed {
                archive: archive_path.to_path_buf(),
                reason: join_err.to_string(),
            };
            error!("Failed to unzip {name}. Reason: {e}");
            return ExtractOutcome::Failed(e);
        }
    };

    if config.delete_after_extract {
        if let Err(e) = tokio::fs::remove_file(archive_path).await {
            warn!("Unzipped {name} but failed to delete the source archive. Reason: {e}");
            return ExtractOutcome::DeleteFailed { extracted_files };
        }
    }

    info!("Unzipped {name} ({} files remaining)", queue.depth());
    ExtractOutcome::Extracted { extracted_files }
}

//! Error types for unzipd
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Extraction, FolderWatch, Config, etc.)
//! - Service lifecycle errors (start while running, stop while stopped)
//! - Context information (archive path, failing entry, config key)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unzipd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for unzipd
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_count")
        key: Option<String>,
    },

    /// Folder watching error (missing source folder, watcher backend failure)
    #[error("folder watch error: {0}")]
    FolderWatch(String),

    /// Archive extraction error
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (config loading)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `start()` was called while the service is already running
    #[error("service is already running")]
    AlreadyRunning,

    /// `stop()` was called while the service is not running
    #[error("service is not running")]
    NotRunning,
}

/// Extraction-related errors
///
/// Covers the failure modes of unpacking a single archive. These never escape the
/// worker loop: the extraction unit catches them, logs the reason, and moves on.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive file could not be opened for reading
    #[error("failed to open archive {}: {reason}", archive.display())]
    OpenFailed {
        /// Path to the archive that could not be opened
        archive: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// The file is not a readable ZIP archive (corrupt, truncated, wrong format)
    #[error("invalid archive {}: {reason}", archive.display())]
    InvalidArchive {
        /// Path to the offending archive
        archive: PathBuf,
        /// The underlying parse failure
        reason: String,
    },

    /// A single entry inside the archive could not be read or written out
    #[error("failed to extract entry from {}: {reason}", archive.display())]
    EntryFailed {
        /// Path to the archive being extracted
        archive: PathBuf,
        /// The underlying entry failure
        reason: String,
    },

    /// The archive name yields no usable destination directory (e.g., no file stem)
    #[error("cannot derive destination directory for {}", archive.display())]
    BadArchiveName {
        /// Path to the offending archive
        archive: PathBuf,
    },

    /// The blocking extraction task panicked or was aborted
    #[error("extraction task failed for {}: {reason}", archive.display())]
    TaskFailed {
        /// Path to the archive being extracted
        archive: PathBuf,
        /// The join failure
        reason: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let err = Error::Config {
            message: "worker_count must be at least 1".to_string(),
            key: Some("worker_count".to_string()),
        };
        assert!(err.to_string().contains("worker_count must be at least 1"));

        let err = Error::Extraction(ExtractionError::InvalidArchive {
            archive: PathBuf::from("/in/bad.zip"),
            reason: "invalid Zip archive".to_string(),
        });
        assert!(err.to_string().contains("bad.zip"));
        assert!(err.to_string().contains("invalid Zip archive"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

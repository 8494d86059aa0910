//! Configuration types for unzipd

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration
///
/// Immutable after construction; the service shares it read-only across the
/// watcher and all workers. Every field has a serde default so partial config
/// files work out of the box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory watched for new `*.zip` files (default: "./in")
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory archives are extracted into (default: "./out")
    ///
    /// Each archive `name.zip` lands in `<destination_dir>/name/`.
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Number of worker tasks extracting concurrently (default: 2, must be >= 1)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Delete the source archive after a successful extraction (default: false)
    #[serde(default)]
    pub delete_after_extract: bool,

    /// Delay between lock-probe attempts while an archive is still being written
    /// (default: 500ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            destination_dir: default_destination_dir(),
            worker_count: default_worker_count(),
            delete_after_extract: false,
            poll_interval: default_poll_interval(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns a [`Error::Config`] naming the offending key if any value is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Config {
                message: "worker_count must be at least 1".to_string(),
                key: Some("worker_count".to_string()),
            });
        }

        if self.source_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "source_dir must not be empty".to_string(),
                key: Some("source_dir".to_string()),
            });
        }

        if self.destination_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "destination_dir must not be empty".to_string(),
                key: Some("destination_dir".to_string()),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll_interval must be non-zero".to_string(),
                key: Some("poll_interval".to_string()),
            });
        }

        Ok(())
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("./in")
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_worker_count() -> usize {
    2
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

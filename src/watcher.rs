//! Folder watching for automatic archive pickup
//!
//! Subscribes to file-creation events in the configured source folder and pushes
//! matching `*.zip` paths onto the shared [`WorkQueue`]. Watching is
//! non-recursive: archives appearing in subdirectories are ignored.
//!
//! The adapter is fire-and-forget: it does not check that an enqueued path still
//! exists — a file that vanishes before a worker reaches it simply fails later
//! in extraction.

use crate::error::{Error, Result};
use crate::queue::WorkQueue;
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Watches the source folder and enqueues newly created ZIP archives
pub struct ZipWatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Watched source folder
    source_dir: PathBuf,
}

impl ZipWatcher {
    /// Create a new watcher feeding the given queue
    ///
    /// Events are filtered and enqueued directly on the notification thread;
    /// the push never blocks.
    ///
    /// # Errors
    /// Returns error if the filesystem watcher cannot be initialized
    pub fn new(queue: Arc<WorkQueue>, source_dir: impl Into<PathBuf>) -> Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => handle_event(&queue, event),
                Err(e) => error!("Filesystem watcher error: {e}"),
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::FolderWatch(e.to_string()))?;

        Ok(Self {
            watcher,
            source_dir: source_dir.into(),
        })
    }

    /// Start watching the source folder
    ///
    /// # Errors
    /// Returns error if the folder cannot be watched (e.g., doesn't exist,
    /// permission denied). This is fatal to service startup: a service watching
    /// nothing is worse than one that refuses to start.
    pub fn start(&mut self) -> Result<()> {
        self.watcher
            .watch(&self.source_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                Error::FolderWatch(format!(
                    "failed to watch {}: {e}",
                    self.source_dir.display()
                ))
            })?;

        info!("Watching folder: {}", self.source_dir.display());
        Ok(())
    }

    /// Stop watching
    pub fn stop(self) {
        // Dropping the watcher tears down the subscription; no further events
        // reach the queue after this returns.
        drop(self.watcher);
        info!("Folder watcher stopped");
    }
}

/// Handle a filesystem event from the watcher callback
///
/// Only creation events for `*.zip` files are enqueued; everything else is
/// ignored.
fn handle_event(queue: &WorkQueue, event: Event) {
    if !matches!(event.kind, EventKind::Create(_)) {
        return;
    }

    for path in event.paths {
        if !is_zip_file(&path) {
            debug!(path = %path.display(), "ignoring non-archive creation event");
            continue;
        }

        let depth = queue.enqueue(path.clone());
        info!(
            "Detected {} ({depth} items pending)",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        );
    }
}

/// Check if a path has the `.zip` extension (case-insensitive)
fn is_zip_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

//! Service lifecycle: wiring the watcher, queue, and worker pool
//!
//! [`UnzipperService`] owns the moving parts and exposes the two operations a
//! host process supervisor needs: [`start`](UnzipperService::start) and
//! [`stop`](UnzipperService::stop). Each start builds a fresh queue and
//! cancellation token; stop discards them, so restart is always clean-slate.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::queue::WorkQueue;
use crate::watcher::ZipWatcher;
use crate::worker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything that only exists while the service runs
struct Running {
    queue: Arc<WorkQueue>,
    cancel: CancellationToken,
    watcher: ZipWatcher,
    workers: Vec<JoinHandle<()>>,
}

/// The folder-watching extraction service
///
/// # Example
///
/// ```no_run
/// use unzipd::{Config, UnzipperService};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config {
///         source_dir: "/srv/incoming".into(),
///         destination_dir: "/srv/unpacked".into(),
///         worker_count: 4,
///         delete_after_extract: true,
///         ..Default::default()
///     };
///
///     let mut service = UnzipperService::new(config)?;
///     service.start()?;
///
///     // ... run until the supervisor asks us to stop ...
///
///     service.stop()?;
///     Ok(())
/// }
/// ```
pub struct UnzipperService {
    config: Arc<Config>,
    running: Option<Running>,
}

impl UnzipperService {
    /// Create a new service from a validated configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            running: None,
        })
    }

    /// Start the service: watcher subscription plus worker pool
    ///
    /// Must be called from within a tokio runtime (workers are spawned onto
    /// it). A missing or unwatchable source folder fails the start; nothing is
    /// left half-wired in that case.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyRunning`] if the service is running, or
    /// [`Error::FolderWatch`] if the source folder cannot be subscribed.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let queue = Arc::new(WorkQueue::new());
        let cancel = CancellationToken::new();

        let mut watcher = ZipWatcher::new(queue.clone(), self.config.source_dir.clone())?;
        watcher.start()?;

        let workers = worker::spawn_workers(queue.clone(), self.config.clone(), cancel.clone());

        info!(
            "Unzipper service started: {} -> {} ({} workers)",
            self.config.source_dir.display(),
            self.config.destination_dir.display(),
            self.config.worker_count,
        );

        self.running = Some(Running {
            queue,
            cancel,
            watcher,
            workers,
        });
        Ok(())
    }

    /// Stop the service
    ///
    /// Fires the cancellation token and tears down the watcher subscription.
    /// Does not wait for in-flight extractions: workers observe cancellation at
    /// their next dequeue or lock-poll checkpoint, and an extraction already
    /// past its lock-check runs to completion on the runtime. Items still
    /// queued are discarded.
    ///
    /// # Errors
    /// Returns [`Error::NotRunning`] if the service is not running.
    pub fn stop(&mut self) -> Result<()> {
        let running = self.running.take().ok_or(Error::NotRunning)?;

        running.cancel.cancel();
        running.watcher.stop();
        drop(running.workers);
        drop(running.queue);

        info!("Unzipper service stopped");
        Ok(())
    }

    /// Whether the service is currently running
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Number of archives currently waiting in the queue (0 when stopped)
    pub fn queue_depth(&self) -> usize {
        self.running.as_ref().map_or(0, |r| r.queue.depth())
    }
}

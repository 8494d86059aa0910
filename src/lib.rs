//! # unzipd
//!
//! Folder-watching ZIP extraction service library.
//!
//! Watches a source directory for newly created `*.zip` archives and extracts
//! each one into `<destination>/<archive name>/` using a fixed pool of worker
//! tasks pulling from a shared in-memory queue. Archives still being written
//! are detected with a best-effort exclusive-lock probe and polled until the
//! writer releases them.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Cooperative shutdown** - A shared cancellation token observed at every
//!   blocking point; no task-kill primitives
//! - **Failures stay local** - A bad archive is logged and left in place, the
//!   worker moves on
//!
//! ## Quick Start
//!
//! ```no_run
//! use unzipd::{Config, UnzipperService, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         source_dir: "/srv/incoming".into(),
//!         destination_dir: "/srv/unpacked".into(),
//!         worker_count: 4,
//!         delete_after_extract: true,
//!         ..Default::default()
//!     };
//!
//!     let mut service = UnzipperService::new(config)?;
//!     service.start()?;
//!
//!     // Run until SIGTERM/SIGINT, then stop the service
//!     run_with_shutdown(service).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Exclusive-lock probing for partially written files
pub mod file_lock;
/// Work queue shared between watcher and workers
pub mod queue;
/// Service lifecycle
pub mod service;
/// Folder watching for automatic archive pickup
pub mod watcher;

mod worker;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, ExtractionError, Result};
pub use extraction::ExtractOutcome;
pub use queue::WorkQueue;
pub use service::UnzipperService;
pub use watcher::ZipWatcher;

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `stop()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Errors
/// Returns the error from `stop()` if teardown fails.
pub async fn run_with_shutdown(mut service: UnzipperService) -> Result<()> {
    wait_for_signal().await;
    service.stop()
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Handler registration may fail in restricted environments (containers,
    // tests); wait on whichever signals could be registered.
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, stopping service"),
                _ = sigint.recv() => tracing::info!("Received SIGINT, stopping service"),
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "SIGINT handler unavailable, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM, stopping service");
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT, stopping service");
        }
        (Err(term_err), Err(int_err)) => {
            tracing::error!(
                sigterm_error = %term_err,
                sigint_error = %int_err,
                "No Unix signal handlers available, falling back to ctrl_c"
            );
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    } else {
        tracing::info!("Received Ctrl+C, stopping service");
    }
}

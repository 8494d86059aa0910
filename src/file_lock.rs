//! Exclusive-lock probing for partially written files
//!
//! A freshly created archive may still be open in the producing process when the
//! creation event fires. Before extracting, workers probe the file by attempting
//! to acquire an exclusive handle: if another process still holds it, the worker
//! sleeps and probes again.
//!
//! This is a best-effort heuristic, not a correctness guarantee — another writer
//! can reacquire the file in the gap between the probe succeeding and extraction
//! opening it. A reacquired lock surfaces later as an extraction failure.

use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Attempt to take an exclusive handle on the file, releasing it immediately.
#[cfg(unix)]
fn probe_exclusive(path: &Path) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let file = std::fs::File::open(path)?;
    // Advisory lock only: cooperating writers must flock too. Mandatory
    // exclusive open does not exist on Unix.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
    Ok(())
}

/// Attempt to take an exclusive handle on the file, releasing it immediately.
#[cfg(windows)]
fn probe_exclusive(path: &Path) -> std::io::Result<()> {
    use std::os::windows::fs::OpenOptionsExt;

    // share_mode(0) refuses to open while any other handle exists, which is
    // exactly the "still being written" signal we want.
    std::fs::OpenOptions::new()
        .read(true)
        .share_mode(0)
        .open(path)
        .map(|_| ())
}

/// ERROR_SHARING_VIOLATION, surfaced by exclusive opens on Windows.
#[cfg(windows)]
const SHARING_VIOLATION: i32 = 32;

/// Check whether the file is currently held by another process
///
/// Returns `true` only for sharing/in-use failures. Any other failure — most
/// notably the file no longer existing — returns `false` so the caller proceeds
/// to extraction, which surfaces the real error.
pub fn is_locked(path: &Path) -> bool {
    match probe_exclusive(path) {
        Ok(()) => false,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::WouldBlock {
                return true;
            }
            #[cfg(windows)]
            if e.raw_os_error() == Some(SHARING_VIOLATION) {
                return true;
            }
            debug!(path = %path.display(), error = %e, "lock probe failed, treating as unlocked");
            false
        }
    }
}

/// Poll until the file is no longer locked, or cancellation fires
///
/// Returns `true` once the file reports unlocked, `false` if the cancellation
/// token fired first. Probes every `poll_interval`; cancellation is observed at
/// each iteration and during the sleep itself.
pub async fn wait_until_unlocked(
    path: &Path,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }

        if !is_locked(path) {
            return true;
        }

        debug!(path = %path.display(), "file still locked, waiting");

        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}

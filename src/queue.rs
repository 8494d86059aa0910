//! Work queue shared between the folder watcher and the worker pool
//!
//! A single producer (the watcher callback) appends pending archive paths;
//! `worker_count` consumers block on [`WorkQueue::dequeue`] until an item
//! arrives or the service is cancelled. Items are handed out in FIFO order,
//! each to exactly one worker. Duplicate paths are independent entries — the
//! queue performs no deduplication.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Thread-safe FIFO of pending archive paths
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<PathBuf>,
    /// Shared across workers: tokio's mpsc receiver is single-consumer, so
    /// workers take turns holding it while waiting for the next item.
    rx: Mutex<mpsc::UnboundedReceiver<PathBuf>>,
    depth: AtomicUsize,
}

impl WorkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            depth: AtomicUsize::new(0),
        }
    }

    /// Append a path to the tail of the queue
    ///
    /// Never blocks. Returns the queue depth after the insert, for the
    /// watcher's "N items pending" log line.
    pub fn enqueue(&self, path: PathBuf) -> usize {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(path).is_err() {
            // Receiver gone means the queue is being torn down; the item is
            // discarded, matching the no-drain-on-stop contract.
            warn!("work queue receiver dropped, discarding item");
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return depth - 1;
        }
        depth
    }

    /// Remove the head of the queue, blocking until an item is available
    ///
    /// Returns `None` if the cancellation token fires while waiting (or has
    /// already fired). A `None` means "stop looping", not an error. While one
    /// worker waits on the receiver the others queue up behind the mutex;
    /// cancellation wins over both waits.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Option<PathBuf> {
        let item = tokio::select! {
            _ = cancel.cancelled() => return None,
            item = async {
                let mut rx = self.rx.lock().await;
                rx.recv().await
            } => item,
        };

        if item.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        item
    }

    /// Number of items currently waiting in the queue
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Close the receiving side, making subsequent enqueues fail
    #[cfg(test)]
    pub(crate) async fn close_receiver(&self) {
        self.rx.lock().await.close();
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

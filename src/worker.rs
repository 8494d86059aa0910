//! Worker pool draining the work queue
//!
//! The service spawns a fixed number of long-lived tasks at start. Each worker
//! loops blocking-dequeue → extract until dequeue reports cancellation; workers
//! are symmetric and process one archive at a time.

use crate::config::Config;
use crate::extraction;
use crate::queue::WorkQueue;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Spawn `config.worker_count` worker tasks
///
/// Returns the join handles. The handles are not awaited on stop: workers exit
/// on their own once the cancellation token fires, and an extraction already
/// past its lock-check runs to completion regardless.
pub(crate) fn spawn_workers(
    queue: Arc<WorkQueue>,
    config: Arc<Config>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    (0..config.worker_count)
        .map(|worker_id| {
            let queue = queue.clone();
            let config = config.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                worker_loop(worker_id, queue, config, cancel).await;
            })
        })
        .collect()
}

/// Single worker loop: dequeue, extract, repeat until cancelled
async fn worker_loop(
    worker_id: usize,
    queue: Arc<WorkQueue>,
    config: Arc<Config>,
    cancel: CancellationToken,
) {
    debug!(worker_id, "worker started");

    while let Some(path) = queue.dequeue(&cancel).await {
        extraction::process_archive(&path, &queue, &config, &cancel).await;
    }

    debug!(worker_id, "worker stopped");
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_sample_zip(path: &Path, content: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        writer.start_file("payload.txt", options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not met within timeout"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn workers_drain_queued_archives() {
        let temp_dir = TempDir::new().unwrap();
        let config = Arc::new(Config {
            source_dir: temp_dir.path().join("in"),
            destination_dir: temp_dir.path().join("out"),
            worker_count: 2,
            delete_after_extract: false,
            poll_interval: Duration::from_millis(20),
        });
        std::fs::create_dir_all(&config.source_dir).unwrap();

        let queue = Arc::new(WorkQueue::new());
        let cancel = CancellationToken::new();
        let handles = spawn_workers(queue.clone(), config.clone(), cancel.clone());
        assert_eq!(handles.len(), 2);

        for name in ["a", "b", "c"] {
            let archive = config.source_dir.join(format!("{name}.zip"));
            write_sample_zip(&archive, name);
            queue.enqueue(archive);
        }

        let dest = config.destination_dir.clone();
        wait_for(|| {
            ["a", "b", "c"]
                .iter()
                .all(|name| dest.join(name).join("payload.txt").exists())
        })
        .await;

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn workers_exit_on_cancellation() {
        let temp_dir = TempDir::new().unwrap();
        let config = Arc::new(Config {
            source_dir: temp_dir.path().join("in"),
            destination_dir: temp_dir.path().join("out"),
            worker_count: 3,
            delete_after_extract: false,
            poll_interval: Duration::from_millis(20),
        });

        let queue = Arc::new(WorkQueue::new());
        let cancel = CancellationToken::new();
        let handles = spawn_workers(queue.clone(), config, cancel.clone());

        cancel.cancel();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("worker should exit promptly after cancellation")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn failed_archive_does_not_stall_the_worker() {
        let temp_dir = TempDir::new().unwrap();
        let config = Arc::new(Config {
            source_dir: temp_dir.path().join("in"),
            destination_dir: temp_dir.path().join("out"),
            worker_count: 1,
            delete_after_extract: false,
            poll_interval: Duration::from_millis(20),
        });
        std::fs::create_dir_all(&config.source_dir).unwrap();

        let bad = config.source_dir.join("bad.zip");
        std::fs::write(&bad, b"garbage").unwrap();
        let good = config.source_dir.join("good.zip");
        write_sample_zip(&good, "still works");

        let queue = Arc::new(WorkQueue::new());
        let cancel = CancellationToken::new();
        let handles = spawn_workers(queue.clone(), config.clone(), cancel.clone());

        // FIFO: the bad archive is processed first and must not kill the loop.
        queue.enqueue(bad.clone());
        queue.enqueue(good);

        let dest = config.destination_dir.clone();
        wait_for(move || dest.join("good/payload.txt").exists()).await;
        assert!(bad.exists(), "failed archive stays in the source folder");

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}

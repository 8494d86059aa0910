//! End-to-end tests: real filesystem watcher, real worker pool, real archives.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use unzipd::{Config, UnzipperService};

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

struct Fixture {
    _temp_dir: TempDir,
    source_dir: PathBuf,
    destination_dir: PathBuf,
    service: UnzipperService,
}

fn start_service(delete_after_extract: bool) -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let source_dir = temp_dir.path().join("in");
    let destination_dir = temp_dir.path().join("out");
    std::fs::create_dir_all(&source_dir).unwrap();

    let config = Config {
        source_dir: source_dir.clone(),
        destination_dir: destination_dir.clone(),
        worker_count: 2,
        delete_after_extract,
        poll_interval: Duration::from_millis(50),
    };

    let mut service = UnzipperService::new(config).unwrap();
    service.start().unwrap();

    Fixture {
        _temp_dir: temp_dir,
        source_dir,
        destination_dir,
        service,
    }
}

async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn archive_is_extracted_and_source_deleted() {
    let mut fx = start_service(true);

    let archive = fx.source_dir.join("a.zip");
    write_zip(&archive, &[("hello.txt", "hello world")]);

    let extracted = fx.destination_dir.join("a/hello.txt");
    wait_for("a.zip to be extracted", || extracted.exists()).await;
    wait_for("a.zip to be deleted", || !archive.exists()).await;

    assert_eq!(std::fs::read_to_string(&extracted).unwrap(), "hello world");
    fx.service.stop().unwrap();
}

#[tokio::test]
async fn corrupted_archive_is_left_in_place() {
    let mut fx = start_service(true);

    let archive = fx.source_dir.join("bad.zip");
    std::fs::write(&archive, b"this is not a zip file").unwrap();

    // There is no positive signal for a failed extraction; give the pipeline
    // ample time and then check nothing happened.
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(
        archive.exists(),
        "failed archive must remain in the source folder"
    );
    assert!(
        !fx.destination_dir.join("bad").exists()
            || std::fs::read_dir(fx.destination_dir.join("bad"))
                .map(|mut d| d.next().is_none())
                .unwrap_or(true),
        "no content may be extracted from a corrupt archive"
    );
    fx.service.stop().unwrap();
}

#[tokio::test]
async fn source_is_kept_when_deletion_is_disabled() {
    let mut fx = start_service(false);

    let archive = fx.source_dir.join("keep.zip");
    write_zip(&archive, &[("data.txt", "contents")]);

    let extracted = fx.destination_dir.join("keep/data.txt");
    wait_for("keep.zip to be extracted", || extracted.exists()).await;

    assert!(archive.exists(), "source must survive with deletion disabled");
    fx.service.stop().unwrap();
}

#[tokio::test]
async fn multiple_archives_are_all_processed() {
    let mut fx = start_service(true);

    let names = ["one", "two", "three", "four", "five"];
    for name in names {
        let archive = fx.source_dir.join(format!("{name}.zip"));
        write_zip(&archive, &[("payload.txt", name)]);
    }

    for name in names {
        let extracted = fx.destination_dir.join(name).join("payload.txt");
        wait_for("all archives to be extracted", || extracted.exists()).await;
        assert_eq!(std::fs::read_to_string(&extracted).unwrap(), name);
    }

    for name in names {
        wait_for("all sources to be deleted", || {
            !fx.source_dir.join(format!("{name}.zip")).exists()
        })
        .await;
    }
    fx.service.stop().unwrap();
}

#[tokio::test]
async fn no_processing_after_stop() {
    let mut fx = start_service(true);
    fx.service.stop().unwrap();

    let archive = fx.source_dir.join("late.zip");
    write_zip(&archive, &[("hello.txt", "too late")]);

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(archive.exists(), "nothing may be consumed after stop");
    assert!(
        !fx.destination_dir.join("late").exists(),
        "nothing may be extracted after stop"
    );
}

#[tokio::test]
async fn service_processes_again_after_restart() {
    let mut fx = start_service(false);
    fx.service.stop().unwrap();
    fx.service.start().unwrap();

    let archive = fx.source_dir.join("second-run.zip");
    write_zip(&archive, &[("hello.txt", "round two")]);

    let extracted = fx.destination_dir.join("second-run/hello.txt");
    wait_for("restarted service to extract", || extracted.exists()).await;
    fx.service.stop().unwrap();
}

mod common;

use std::fs;
use std::path::Path;

use slapseg::batch::{run_batch, BatchOptions, Operation};
use slapseg::config::EngineConfig;
use slapseg::engine::SlapSegmenter;
use slapseg::io::manifest::read_manifest;
use slapseg::model::Kind;

fn options(root: &Path, jobs: usize, seed: Option<u64>, operation: Operation) -> BatchOptions {
    BatchOptions {
        image_dir: root.join("images"),
        output_dir: root.join("out"),
        jobs,
        seed,
        operation,
    }
}

/// Six right hands and two thumb slaps, all ThreeInch.
fn fixture(root: &Path) -> Vec<slapseg::io::manifest::ManifestEntry> {
    let images = root.join("images");
    let mut rows = Vec::new();
    for i in 0..6 {
        let name = format!("hand{}.raw", i);
        common::write_right_hand(&images.join(&name));
        rows.push(format!("{},500,500,500,ThreeInch,OpticalTirBright,Right", name));
    }
    for i in 0..2 {
        let name = format!("thumbs{}.raw", i);
        common::write_raw(
            &images.join(&name),
            1400,
            700,
            &[(200, 100, 200, 400), (1000, 120, 210, 380)],
        );
        rows.push(format!("{},1400,700,500,ThreeInch,OpticalTirBright,Thumbs", name));
    }
    let manifest = root.join("manifest.csv");
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    common::write_manifest(&manifest, &rows);
    read_manifest(&manifest).expect("read manifest")
}

/// Log rows with the elapsed column removed.
fn rows_without_timing(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read log")
        .lines()
        .skip(1)
        .map(|line| {
            let mut fields: Vec<&str> = line.split(',').collect();
            fields.remove(1);
            fields.join(",")
        })
        .collect()
}

#[test]
fn segment_batch_writes_one_row_per_position() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());

    let summary = run_batch(
        &SlapSegmenter::default(),
        &entries,
        &options(dir.path(), 2, Some(1), Operation::Segment),
    )
    .expect("run batch");

    assert_eq!(summary.processed, 8);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.logs.len(), 2);

    let total: usize = summary
        .logs
        .iter()
        .map(|log| rows_without_timing(log).len())
        .sum();
    // six hands of four, two slaps of two thumbs
    assert_eq!(total, 6 * 4 + 2 * 2);

    for log in &summary.logs {
        let text = fs::read_to_string(log).expect("read log");
        assert!(text.starts_with(concat!(
            "name,elapsed,rCode,rMessage,frgp,tlx,tly,trx,try,blx,bly,brx,bry,",
            "sCode,sMessage,errors,deficiencies,correctQuantity"
        )));
    }
}

#[test]
fn seeded_batches_are_reproducible() {
    let first_dir = tempfile::tempdir().expect("create temp dir");
    let second_dir = tempfile::tempdir().expect("create temp dir");
    let first_entries = fixture(first_dir.path());
    let second_entries = fixture(second_dir.path());
    let engine = SlapSegmenter::default();

    let first = run_batch(
        &engine,
        &first_entries,
        &options(first_dir.path(), 2, Some(99), Operation::Segment),
    )
    .expect("first batch");
    let second = run_batch(
        &engine,
        &second_entries,
        &options(second_dir.path(), 2, Some(99), Operation::Segment),
    )
    .expect("second batch");

    for (a, b) in first.logs.iter().zip(&second.logs) {
        assert_eq!(a.file_name(), b.file_name());
        assert_eq!(rows_without_timing(a), rows_without_timing(b));
    }
}

#[test]
fn small_groups_use_fewer_sets() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());

    let summary = run_batch(
        &SlapSegmenter::default(),
        &entries,
        &options(dir.path(), 8, Some(3), Operation::Segment),
    )
    .expect("run batch");
    // eight images split into at most three sets (3, 3, 2)
    assert_eq!(summary.logs.len(), 3);
}

#[test]
fn orientation_batch() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());

    let summary = run_batch(
        &SlapSegmenter::default(),
        &entries,
        &options(dir.path(), 1, Some(5), Operation::Orientation),
    )
    .expect("run batch");

    assert_eq!(summary.logs.len(), 1);
    assert!(summary.logs[0].ends_with("orientation-3-0.log"));
    let text = fs::read_to_string(&summary.logs[0]).expect("read log");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("name,elapsed,rCode,rMessage,orientation"));
    assert_eq!(lines.count(), 8);
}

#[test]
fn orientation_batch_skipped_when_unsupported() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());
    let engine = SlapSegmenter::new(EngineConfig {
        determine_orientation: false,
        ..EngineConfig::default()
    });

    let summary = run_batch(
        &engine,
        &entries,
        &options(dir.path(), 1, None, Operation::Orientation),
    )
    .expect("run batch");
    assert!(summary.logs.is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unsupported_kinds_are_skipped() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());
    let engine = SlapSegmenter::new(EngineConfig {
        kinds: [Kind::TwoInch].into_iter().collect(),
        ..EngineConfig::default()
    });

    let summary = run_batch(
        &engine,
        &entries,
        &options(dir.path(), 1, Some(1), Operation::Segment),
    )
    .expect("run batch");
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 8);
}

#[test]
fn malformed_image_is_logged_not_fatal() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let images = dir.path().join("images");
    fs::create_dir_all(&images).expect("create image dir");
    fs::write(images.join("short.raw"), vec![255u8; 10]).expect("write raw");
    let manifest = dir.path().join("manifest.csv");
    common::write_manifest(
        &manifest,
        &["short.raw,500,500,500,TwoInch,Unknown,Thumbs"],
    );
    let entries = read_manifest(&manifest).expect("read manifest");

    let summary = run_batch(
        &SlapSegmenter::default(),
        &entries,
        &options(dir.path(), 1, Some(1), Operation::Segment),
    )
    .expect("run batch");

    let rows = rows_without_timing(&summary.logs[0]);
    assert_eq!(rows.len(), 2);
    for row in rows {
        // InvalidImageData, no geometry
        assert!(row.starts_with("short.raw,1,"), "{}", row);
        assert!(row.contains(",NA,NA,"), "{}", row);
    }
}

#[test]
fn zero_jobs_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());
    assert!(run_batch(
        &SlapSegmenter::default(),
        &entries,
        &options(dir.path(), 0, None, Operation::Segment),
    )
    .is_err());
}

#[test]
fn unwritable_output_dir_names_the_path() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let entries = fixture(dir.path());
    // a regular file where the output directory should go
    fs::write(dir.path().join("out"), b"").expect("write blocker");

    let err = run_batch(
        &SlapSegmenter::default(),
        &entries,
        &options(dir.path(), 1, None, Operation::Segment),
    )
    .unwrap_err();

    assert!(matches!(err, slapseg::SlapsegError::FileWrite { .. }), "{}", err);
    assert!(err.to_string().contains("out"), "{}", err);
}

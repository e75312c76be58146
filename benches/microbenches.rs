//! Criterion microbenches for the segmentation engine.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - Otsu thresholding of a full slap image
//! - Segmentation of a synthetic four-finger slap, sequential and parallel
//! - Manifest parsing

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use slapseg::config::EngineConfig;
use slapseg::engine::foreground::otsu;
use slapseg::engine::{Segmenter, SlapSegmenter};
use slapseg::io::manifest::from_manifest_slice;
use slapseg::model::{CaptureTechnology, Kind, Orientation, SlapImage};

const WIDTH: usize = 1600;
const HEIGHT: usize = 1000;

/// A 1600x1000, 500 ppi right hand with slightly staggered fingertips.
fn right_hand() -> SlapImage {
    let mut pixels = vec![235u8; WIDTH * HEIGHT];
    for (i, top) in [180usize, 100, 140, 300].into_iter().enumerate() {
        let x = 200 + i * 320;
        for row in top..HEIGHT - 40 {
            // ridges every 10 pixels
            for col in x..x + 220 {
                pixels[row * WIDTH + col] = if (row / 5) % 2 == 0 { 30 } else { 90 };
            }
        }
    }
    SlapImage::new(
        WIDTH as u16,
        HEIGHT as u16,
        500,
        Kind::TwoInch,
        CaptureTechnology::OpticalTirBright,
        Orientation::Right,
        pixels,
    )
    .expect("valid bench image")
}

fn manifest() -> String {
    let mut text = String::from("name,width,height,ppi,kind,capture_technology,orientation\n");
    for i in 0..500 {
        text.push_str(&format!(
            "img{:04}.raw,1600,1000,500,TwoInch,ScannedInkOnPaper,Right\n",
            i
        ));
    }
    text
}

/// Benchmark the global threshold.
fn bench_otsu(c: &mut Criterion) {
    let image = right_hand();
    let mut group = c.benchmark_group("foreground");
    group.throughput(Throughput::Bytes(image.pixels().len() as u64));

    group.bench_function("otsu", |b| {
        b.iter(|| black_box(otsu(black_box(image.pixels()))))
    });

    group.finish();
}

/// Benchmark whole-image segmentation with and without rayon.
fn bench_segment(c: &mut Criterion) {
    let image = right_hand();
    let parallel = SlapSegmenter::default();
    let sequential = SlapSegmenter::new(EngineConfig {
        parallel: false,
        ..EngineConfig::default()
    });

    let mut group = c.benchmark_group("segment");
    group.throughput(Throughput::Bytes(image.pixels().len() as u64));
    group.sample_size(20);

    group.bench_function("parallel", |b| {
        b.iter(|| black_box(parallel.segment(black_box(&image))))
    });
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(sequential.segment(black_box(&image))))
    });

    group.finish();
}

/// Benchmark manifest parsing.
fn bench_manifest_parse(c: &mut Criterion) {
    let text = manifest();
    let mut group = c.benchmark_group("manifest_parse");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("from_manifest_slice", |b| {
        b.iter(|| {
            let entries = from_manifest_slice(black_box(text.as_bytes())).unwrap();
            black_box(entries)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_otsu, bench_segment, bench_manifest_parse);
criterion_main!(benches);

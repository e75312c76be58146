#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use slapseg::model::{CaptureTechnology, Kind, Orientation, RawSlapImage, SlapImage};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(32);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_kind() -> impl Strategy<Value = Kind> {
    prop::sample::select(Kind::ALL.to_vec())
}

pub fn arb_orientation() -> impl Strategy<Value = Orientation> {
    prop::sample::select(Orientation::ALL.to_vec())
}

pub fn arb_capture_technology() -> impl Strategy<Value = CaptureTechnology> {
    prop::sample::select(CaptureTechnology::ALL.to_vec())
}

/// A blob as fractions of the image: `(x, y, w, h)`.
type FractionalBlob = (f64, f64, f64, f64);

fn arb_blob() -> impl Strategy<Value = FractionalBlob> {
    (0.0f64..0.9, 0.0f64..0.9, 0.05f64..0.4, 0.1f64..0.8)
}

/// Paints blobs of `ink` on a `paper` background.
fn paint(width: usize, height: usize, paper: u8, ink: u8, blobs: &[FractionalBlob]) -> Vec<u8> {
    let mut pixels = vec![paper; width * height];
    for &(fx, fy, fw, fh) in blobs {
        let x0 = (fx * width as f64) as usize;
        let y0 = (fy * height as f64) as usize;
        let x1 = (x0 + (fw * width as f64) as usize).min(width);
        let y1 = (y0 + (fh * height as f64) as usize).min(height);
        for row in y0..y1 {
            pixels[row * width + x0..row * width + x1].fill(ink);
        }
    }
    pixels
}

/// Small images with a handful of dark blobs, covering every kind,
/// orientation and capture technology.
pub fn arb_slap_image() -> impl Strategy<Value = SlapImage> {
    (
        60u16..220,
        60u16..220,
        arb_kind(),
        arb_orientation(),
        arb_capture_technology(),
        150u8..=255,
        0u8..120,
        prop::collection::vec(arb_blob(), 0..6),
    )
        .prop_map(|(width, height, kind, orientation, technology, paper, ink, blobs)| {
            let pixels = paint(usize::from(width), usize::from(height), paper, ink, &blobs);
            SlapImage::new(width, height, 500, kind, technology, orientation, pixels)
                .expect("generated image is valid")
        })
}

/// Raw parts that may or may not form a valid image.
pub fn arb_raw_image() -> impl Strategy<Value = RawSlapImage> {
    (
        0u16..64,
        0u16..64,
        prop_oneof![Just(0u16), Just(500u16), 1u16..2000],
        0u8..10,
        0u8..5,
        0u8..4,
        prop::collection::vec(any::<u8>(), 0..4096),
    )
        .prop_map(
            |(width, height, ppi, kind, capture_technology, orientation, pixels)| RawSlapImage {
                width,
                height,
                ppi,
                kind,
                capture_technology,
                orientation,
                pixels,
            },
        )
}

//! Fuzz target for segmentation of arbitrary raw images.
//!
//! The first eight bytes choose width, height, kind, capture technology and
//! orientation; the rest are pixels. The segmenter must never panic, and
//! located fingers must stay inside the image.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slapseg::engine::{Segmenter, SlapSegmenter};
use slapseg::model::RawSlapImage;

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 || data.len() > 1024 * 1024 {
        return;
    }

    let raw = RawSlapImage {
        width: u16::from_le_bytes([data[0], data[1]]) % 1024,
        height: u16::from_le_bytes([data[2], data[3]]) % 1024,
        ppi: 500,
        kind: data[4] % 10,
        capture_technology: data[5] % 4,
        orientation: data[6] % 4,
        pixels: data[8..].to_vec(),
    };
    let (width, height) = (u32::from(raw.width), u32::from(raw.height));

    let result = SlapSegmenter::default().segment_raw(raw);
    for position in &result.positions {
        if let Some(quad) = position.quad() {
            assert!(quad.is_within(width, height));
        }
    }
});

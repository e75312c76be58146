#![allow(dead_code)]

use std::fs;
use std::path::Path;

use slapseg::model::{CaptureTechnology, Kind, Orientation, SlapImage};

/// A block of ink at `(x, y)` of size `w` x `h`, in pixels.
pub type Blob = (usize, usize, usize, usize);

/// White raw pixels with black rectangles.
pub fn raw_pixels(width: usize, height: usize, blobs: &[Blob]) -> Vec<u8> {
    let mut pixels = vec![255u8; width * height];
    for &(x, y, w, h) in blobs {
        for row in y..(y + h).min(height) {
            let end = (x + w).min(width);
            pixels[row * width + x..row * width + end].fill(0);
        }
    }
    pixels
}

/// Four upright fingers, 70 x 400 pixels, on a 500 x 500 image.
pub fn four_fingers() -> Vec<Blob> {
    (0..4).map(|i| (35 + i * 120, 50, 70, 400)).collect()
}

pub fn slap_image(
    width: u16,
    height: u16,
    kind: Kind,
    orientation: Orientation,
    blobs: &[Blob],
) -> SlapImage {
    SlapImage::new(
        width,
        height,
        500,
        kind,
        CaptureTechnology::OpticalTirBright,
        orientation,
        raw_pixels(usize::from(width), usize::from(height), blobs),
    )
    .expect("valid image")
}

pub fn right_hand() -> SlapImage {
    slap_image(500, 500, Kind::ThreeInch, Orientation::Right, &four_fingers())
}

/// Writes the four-finger right hand as a raw file.
pub fn write_right_hand(path: &Path) {
    write_raw(path, 500, 500, &four_fingers());
}

pub fn write_raw(path: &Path, width: usize, height: usize, blobs: &[Blob]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, raw_pixels(width, height, blobs)).expect("write raw image");
}

pub const MANIFEST_HEADER: &str = "name,width,height,ppi,kind,capture_technology,orientation";

/// Writes a manifest with the given rows (without header).
pub fn write_manifest(path: &Path, rows: &[&str]) {
    let mut text = String::from(MANIFEST_HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(path, text).expect("write manifest");
}

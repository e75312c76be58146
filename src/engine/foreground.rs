//! Foreground extraction: gray threshold and block map.

use crate::config::ForegroundConfig;
use crate::model::{CaptureTechnology, SlapImage};

/// Result of Otsu thresholding on the gray histogram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    /// Highest gray level counted as ink, or `None` when the histogram holds
    /// a single level.
    pub level: Option<u8>,
    /// Between-class variance over total variance, in `[0, 1]`.
    pub separability: f64,
    /// Spread between the darkest and lightest level present.
    pub contrast: u8,
}

impl Threshold {
    #[inline]
    pub fn is_ink(&self, value: u8) -> bool {
        self.level.is_some_and(|level| value <= level)
    }
}

/// Computes the Otsu threshold of `pixels`.
pub fn otsu(pixels: &[u8]) -> Threshold {
    let mut hist = [0u64; 256];
    for &p in pixels {
        hist[usize::from(p)] += 1;
    }

    let n = pixels.len() as f64;
    let lo = hist.iter().position(|&h| h > 0);
    let hi = hist.iter().rposition(|&h| h > 0);
    let contrast = match (lo, hi) {
        (Some(lo), Some(hi)) => (hi - lo) as u8,
        _ => 0,
    };

    let sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();
    let mean = if n > 0.0 { sum / n } else { 0.0 };
    let total_var: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| h as f64 * (i as f64 - mean).powi(2))
        .sum::<f64>()
        / n.max(1.0);

    if total_var <= 0.0 {
        return Threshold {
            level: None,
            separability: 0.0,
            contrast,
        };
    }

    let mut best_level = None;
    let mut best_between = -1.0;
    let mut w0 = 0.0;
    let mut sum0 = 0.0;
    for (t, &h) in hist.iter().enumerate() {
        w0 += h as f64;
        if w0 == 0.0 {
            continue;
        }
        let w1 = n - w0;
        if w1 == 0.0 {
            break;
        }
        sum0 += t as f64 * h as f64;
        let m0 = sum0 / w0;
        let m1 = (sum - sum0) / w1;
        let between = w0 * w1 * (m0 - m1).powi(2) / (n * n);
        if between > best_between {
            best_between = between;
            best_level = Some(t as u8);
        }
    }

    Threshold {
        level: best_level,
        separability: (best_between.max(0.0) / total_var).min(1.0),
        contrast,
    }
}

/// The image tiled into square blocks marked foreground or background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockMap {
    pub block_size: usize,
    pub cols: usize,
    pub rows: usize,
    cells: Vec<bool>,
}

impl BlockMap {
    pub fn new(block_size: usize, cols: usize, rows: usize) -> Self {
        Self {
            block_size,
            cols,
            rows,
            cells: vec![false; cols * rows],
        }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> bool {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: bool) {
        self.cells[row * self.cols + col] = value;
    }

    /// Number of foreground blocks.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Foreground blocks and total blocks in the 3x3 window around a block,
    /// clipped at the border.
    fn neighbourhood(&self, col: usize, row: usize) -> (usize, usize) {
        let c0 = col.saturating_sub(1);
        let c1 = (col + 1).min(self.cols - 1);
        let r0 = row.saturating_sub(1);
        let r1 = (row + 1).min(self.rows - 1);
        let mut set = 0;
        for r in r0..=r1 {
            for c in c0..=c1 {
                if self.get(c, r) {
                    set += 1;
                }
            }
        }
        (set, (c1 - c0 + 1) * (r1 - r0 + 1))
    }

    /// 3x3 dilation.
    pub fn dilate(&self) -> Self {
        self.map_neighbourhood(|set, _| set > 0)
    }

    /// 3x3 erosion; blocks beyond the border are ignored.
    pub fn erode(&self) -> Self {
        self.map_neighbourhood(|set, total| set == total)
    }

    pub fn close(&self) -> Self {
        self.dilate().erode()
    }

    pub fn open(&self) -> Self {
        self.erode().dilate()
    }

    fn map_neighbourhood<F>(&self, f: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut out = Self::new(self.block_size, self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let (set, total) = self.neighbourhood(col, row);
                out.set(col, row, f(set, total));
            }
        }
        out
    }
}

/// Ink threshold and foreground blocks of one image.
#[derive(Clone, Debug)]
pub struct Foreground {
    pub threshold: Threshold,
    pub blocks: BlockMap,
    /// Contrast or separability below the configured minimum.
    pub low_contrast: bool,
}

impl Foreground {
    #[inline]
    pub fn is_ink(&self, value: u8) -> bool {
        self.threshold.is_ink(value)
    }
}

/// Side of a block in pixels at the given resolution.
pub fn block_size(ppi: u16, config: &ForegroundConfig) -> usize {
    let size = (f64::from(ppi) * config.block_size_in).round();
    if size.is_finite() && size > 4.0 {
        size as usize
    } else {
        4
    }
}

/// Thresholds `image` and builds its closed block map.
pub fn extract(image: &SlapImage, config: &ForegroundConfig) -> Foreground {
    let threshold = otsu(image.pixels());
    let low_contrast = threshold.separability < config.min_separability
        || threshold.contrast < config.min_contrast;

    let width = usize::from(image.width());
    let height = usize::from(image.height());
    let bs = block_size(image.ppi(), config);
    let cols = width.div_ceil(bs);
    let rows = height.div_ceil(bs);

    let min_fill = match image.capture_technology() {
        CaptureTechnology::ScannedInkOnPaper => config.ink_min_block_fill,
        CaptureTechnology::Unknown | CaptureTechnology::OpticalTirBright => config.min_block_fill,
    };

    let mut ink = vec![0usize; cols];
    let mut blocks = BlockMap::new(bs, cols, rows);
    for row in 0..rows {
        ink.iter_mut().for_each(|c| *c = 0);
        let y0 = row * bs;
        let y1 = (y0 + bs).min(height);
        for y in y0..y1 {
            for (x, &p) in image.row(y).iter().enumerate() {
                if threshold.is_ink(p) {
                    ink[x / bs] += 1;
                }
            }
        }
        for (col, &count) in ink.iter().enumerate() {
            let x0 = col * bs;
            let x1 = (x0 + bs).min(width);
            let area = (x1 - x0) * (y1 - y0);
            let fill = count as f64 / area as f64;
            blocks.set(col, row, count > 0 && fill >= min_fill);
        }
    }

    if image.capture_technology() == CaptureTechnology::ScannedInkOnPaper {
        blocks = blocks.open();
    }
    let blocks = blocks.close();

    log::debug!(
        "foreground: level={:?} separability={:.3} contrast={} block={}px blocks={}/{}",
        threshold.level,
        threshold.separability,
        threshold.contrast,
        bs,
        blocks.count(),
        cols * rows
    );

    Foreground {
        threshold,
        blocks,
        low_contrast,
    }
}

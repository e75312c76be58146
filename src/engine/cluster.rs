//! Candidate finger detection on the block map.
//!
//! Connected components give the coarse regions. Touching fingers share a
//! component, so wide components are split at valleys of the column
//! projection of their fingertip band.

use std::collections::VecDeque;

use super::foreground::BlockMap;
use crate::config::ClusterConfig;

/// One candidate finger: a column range of a labelled component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub label: u32,
    /// First block column.
    pub col_start: usize,
    /// One past the last block column.
    pub col_end: usize,
    /// Topmost block row holding the candidate.
    pub top_row: usize,
    /// Number of blocks.
    pub blocks: usize,
}

/// Component labels of a block map and the candidates cut from them.
#[derive(Clone, Debug)]
pub struct Clusters {
    pub cols: usize,
    pub rows: usize,
    /// Component label per block, 0 for background.
    labels: Vec<u32>,
    pub candidates: Vec<Candidate>,
}

impl Clusters {
    #[inline]
    pub fn label(&self, col: usize, row: usize) -> u32 {
        self.labels[row * self.cols + col]
    }

    /// Returns true if block `(col, row)` belongs to `candidate`.
    #[inline]
    pub fn owns(&self, candidate: &Candidate, col: usize, row: usize) -> bool {
        col >= candidate.col_start
            && col < candidate.col_end
            && self.label(col, row) == candidate.label
    }

    /// Returns true if `(col, row)` is owned by `candidate`, or is a
    /// background block next to one it owns.
    ///
    /// Ink that only grazes a block leaves it background, so pixels there
    /// still count towards the neighbouring candidate.
    pub fn claims(&self, candidate: &Candidate, col: usize, row: usize) -> bool {
        if self.owns(candidate, col, row) {
            return true;
        }
        if self.label(col, row) != 0 {
            return false;
        }
        (col > 0 && self.owns(candidate, col - 1, row))
            || (col + 1 < self.cols && self.owns(candidate, col + 1, row))
            || (row > 0 && self.owns(candidate, col, row - 1))
            || (row + 1 < self.rows && self.owns(candidate, col, row + 1))
    }
}

/// Labels 4-connected components; returns the labels and the block count of
/// each label (index 0 unused).
pub fn label_components(map: &BlockMap) -> (Vec<u32>, Vec<usize>) {
    let mut labels = vec![0u32; map.cols * map.rows];
    let mut sizes = vec![0usize];
    let mut queue = VecDeque::new();

    for start_row in 0..map.rows {
        for start_col in 0..map.cols {
            if !map.get(start_col, start_row) || labels[start_row * map.cols + start_col] != 0 {
                continue;
            }
            let label = sizes.len() as u32;
            let mut size = 0;
            labels[start_row * map.cols + start_col] = label;
            queue.push_back((start_col, start_row));

            while let Some((col, row)) = queue.pop_front() {
                size += 1;
                let mut visit = |c: usize, r: usize| {
                    let idx = r * map.cols + c;
                    if map.get(c, r) && labels[idx] == 0 {
                        labels[idx] = label;
                        queue.push_back((c, r));
                    }
                };
                if col > 0 {
                    visit(col - 1, row);
                }
                if col + 1 < map.cols {
                    visit(col + 1, row);
                }
                if row > 0 {
                    visit(col, row - 1);
                }
                if row + 1 < map.rows {
                    visit(col, row + 1);
                }
            }
            sizes.push(size);
        }
    }

    (labels, sizes)
}

/// Block-space parameters derived from a [`ClusterConfig`] at one resolution.
#[derive(Clone, Copy, Debug)]
struct Limits {
    min_blocks: usize,
    band_rows: usize,
    max_cols: usize,
    valley_ratio: f64,
}

impl Limits {
    fn new(block_size: usize, ppi: u16, config: &ClusterConfig) -> Self {
        let block_in = block_size as f64 / f64::from(ppi);
        let to_blocks = |inches: f64| (inches / block_in).round().max(1.0) as usize;
        Self {
            min_blocks: (config.min_finger_area_in2 / (block_in * block_in)).ceil().max(1.0)
                as usize,
            band_rows: to_blocks(config.fingertip_length_in),
            max_cols: to_blocks(config.max_finger_width_in),
            valley_ratio: config.split_valley_ratio,
        }
    }
}

/// Finds candidate fingers in a block map, ordered by first column.
pub fn detect(map: &BlockMap, ppi: u16, config: &ClusterConfig) -> Clusters {
    let (labels, sizes) = label_components(map);
    let limits = Limits::new(map.block_size, ppi, config);
    let mut clusters = Clusters {
        cols: map.cols,
        rows: map.rows,
        labels,
        candidates: Vec::new(),
    };

    let mut found = Vec::new();
    for (label, &size) in sizes.iter().enumerate().skip(1) {
        if size < limits.min_blocks {
            log::debug!("dropping component {} ({} blocks)", label, size);
            continue;
        }
        let label = label as u32;
        let Some((col_start, col_end)) = clusters.column_span(label, 0, map.cols) else {
            continue;
        };
        clusters.split(label, col_start, col_end, &limits, &mut found);
    }

    found.retain(|c| {
        if c.blocks < limits.min_blocks {
            return false;
        }
        if c.col_end - c.col_start > 2 * limits.max_cols {
            log::debug!(
                "dropping candidate {}..{} wider than two fingers",
                c.col_start,
                c.col_end
            );
            return false;
        }
        true
    });
    found.sort_by_key(|c| (c.col_start, c.top_row));
    clusters.candidates = found;
    clusters
}

impl Clusters {
    /// Smallest column range within `[start, end)` holding `label`.
    fn column_span(&self, label: u32, start: usize, end: usize) -> Option<(usize, usize)> {
        let has = |col: usize| (0..self.rows).any(|row| self.label(col, row) == label);
        let first = (start..end).find(|&c| has(c))?;
        let last = (start..end).rev().find(|&c| has(c))?;
        Some((first, last + 1))
    }

    fn top_row(&self, label: u32, start: usize, end: usize) -> Option<usize> {
        (0..self.rows).find(|&row| (start..end).any(|col| self.label(col, row) == label))
    }

    /// Column projection of the fingertip band of `label` within `[start, end)`.
    fn band_projection(
        &self,
        label: u32,
        start: usize,
        end: usize,
        top: usize,
        band: usize,
    ) -> Vec<usize> {
        let bottom = (top + band).min(self.rows);
        (start..end)
            .map(|col| (top..bottom).filter(|&row| self.label(col, row) == label).count())
            .collect()
    }

    fn block_count(&self, label: u32, start: usize, end: usize) -> usize {
        (0..self.rows)
            .map(|row| (start..end).filter(|&col| self.label(col, row) == label).count())
            .sum()
    }

    fn split(
        &self,
        label: u32,
        start: usize,
        end: usize,
        limits: &Limits,
        out: &mut Vec<Candidate>,
    ) {
        let Some(top) = self.top_row(label, start, end) else {
            return;
        };
        let candidate = Candidate {
            label,
            col_start: start,
            col_end: end,
            top_row: top,
            blocks: self.block_count(label, start, end),
        };

        if end - start <= limits.max_cols {
            out.push(candidate);
            return;
        }

        let projection = self.band_projection(label, start, end, top, limits.band_rows);
        match deepest_valley(&projection, limits.valley_ratio) {
            Some(valley) => {
                // drop the whole flat bottom of the valley
                let floor = projection[valley];
                let mut lo = valley;
                while lo > 0 && projection[lo - 1] <= floor {
                    lo -= 1;
                }
                let mut hi = valley;
                while hi + 1 < projection.len() && projection[hi + 1] <= floor {
                    hi += 1;
                }
                log::debug!(
                    "splitting component {} at columns {}..={}",
                    label,
                    start + lo,
                    start + hi
                );
                for (lo, hi) in [(start, start + lo), (start + hi + 1, end)] {
                    if let Some((s, e)) = self.band_span(label, lo, hi, limits.band_rows) {
                        self.split(label, s, e, limits, out);
                    }
                }
            }
            None => out.push(candidate),
        }
    }

    /// Column range within `[start, end)` where the fingertip band of
    /// `label` is present.
    fn band_span(
        &self,
        label: u32,
        start: usize,
        end: usize,
        band: usize,
    ) -> Option<(usize, usize)> {
        let top = self.top_row(label, start, end)?;
        let projection = self.band_projection(label, start, end, top, band);
        let first = projection.iter().position(|&p| p > 0)?;
        let last = projection.iter().rposition(|&p| p > 0)?;
        Some((start + first, start + last + 1))
    }
}

/// Index of the valley with the lowest depth relative to the smaller of the
/// highest peaks on either side, if that depth is below `ratio`.
///
/// Ties go to the valley closest to the middle.
pub fn deepest_valley(projection: &[usize], ratio: f64) -> Option<usize> {
    let n = projection.len();
    if n < 3 {
        return None;
    }

    let mut left_peak = vec![0usize; n];
    let mut right_peak = vec![0usize; n];
    for i in 1..n {
        left_peak[i] = left_peak[i - 1].max(projection[i - 1]);
    }
    for i in (0..n - 1).rev() {
        right_peak[i] = right_peak[i + 1].max(projection[i + 1]);
    }

    let middle = (n - 1) as f64 / 2.0;
    let mut best: Option<(f64, f64, usize)> = None;
    for i in 1..n - 1 {
        let peak = left_peak[i].min(right_peak[i]);
        if peak == 0 {
            continue;
        }
        let depth = projection[i] as f64 / peak as f64;
        if depth >= ratio {
            continue;
        }
        let distance = (i as f64 - middle).abs();
        let better = match best {
            None => true,
            Some((d, dist, _)) => depth < d || (depth == d && distance < dist),
        };
        if better {
            best = Some((depth, distance, i));
        }
    }
    best.map(|(_, _, i)| i)
}

//! Manifest-driven batch runs.
//!
//! Images are grouped by slap kind. Each group is shuffled, split into
//! `jobs` sets, and the sets are processed in parallel, each writing its own
//! log to the output directory:
//!
//! - `segments-<kind>-<set>.log` for segmentation
//! - `orientation-<kind>-<set>.log` for orientation determination
//!
//! `<kind>` is the numeric slap kind code. With a seed the shuffle, and so
//! the content of every log, is reproducible.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::engine::Segmenter;
use crate::error::SlapsegError;
use crate::io::log::{OrientationLog, SegmentLog};
use crate::io::manifest::ManifestEntry;
use crate::model::{Kind, ReturnStatus, SlapImage};

/// What a batch run asks of the segmenter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operation {
    #[default]
    Segment,
    Orientation,
}

impl Operation {
    fn log_prefix(self) -> &'static str {
        match self {
            Operation::Segment => "segments",
            Operation::Orientation => "orientation",
        }
    }
}

/// Options for a batch run.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Directory manifest names are resolved against.
    pub image_dir: PathBuf,
    /// Directory receiving the logs; created if missing.
    pub output_dir: PathBuf,
    /// Number of sets processed in parallel, at least one.
    pub jobs: usize,
    /// Shuffle seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    pub operation: Operation,
}

/// What a batch run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Images handed to the segmenter.
    pub processed: usize,
    /// Images skipped because their kind is not supported.
    pub skipped: usize,
    /// Logs written, in kind then set order.
    pub logs: Vec<PathBuf>,
}

/// Splits `items` into `sets` contiguous sets of near-equal size.
///
/// Zero sets yields nothing and one set yields everything. Every set gets
/// `ceil(len / sets)` items except possibly the last.
///
/// # Errors
/// Returns [`SlapsegError::InvalidArguments`] when that set size is smaller
/// than the number of sets.
pub fn split_set<T: Clone>(items: &[T], sets: usize) -> Result<Vec<Vec<T>>, SlapsegError> {
    match sets {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![items.to_vec()]),
        _ => {}
    }

    let size = items.len().div_ceil(sets);
    if size < sets {
        return Err(SlapsegError::InvalidArguments(format!(
            "too many sets: {} item(s) cannot be split into {} sets",
            items.len(),
            sets
        )));
    }

    Ok((0..sets)
        .map(|i| {
            let start = (size * i).min(items.len());
            let end = (size * (i + 1)).min(items.len());
            items[start..end].to_vec()
        })
        .collect())
}

/// Shuffles `items` in place, reproducibly when `seed` is given.
pub fn shuffle<T>(items: &mut [T], seed: Option<u64>) {
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        items.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        items.shuffle(&mut rng);
    }
}

/// Runs `opts.operation` over every manifest entry.
///
/// # Errors
/// Fails on invalid options, unreadable image files, and log write errors.
/// Images whose pixel data does not match their metadata are logged with
/// an `InvalidImageData` status instead.
pub fn run_batch<S: Segmenter + ?Sized>(
    segmenter: &S,
    entries: &[ManifestEntry],
    opts: &BatchOptions,
) -> Result<BatchSummary, SlapsegError> {
    if opts.jobs == 0 {
        return Err(SlapsegError::InvalidArguments(
            "jobs must be at least 1".to_string(),
        ));
    }

    let supported = segmenter.supported();
    let mut summary = BatchSummary::default();
    if opts.operation == Operation::Orientation && !supported.determines_orientation {
        log::info!("orientation determination not supported, nothing to do");
        return Ok(summary);
    }

    fs::create_dir_all(&opts.output_dir).map_err(|source| SlapsegError::FileWrite {
        path: opts.output_dir.clone(),
        source,
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
        .map_err(|e| {
            SlapsegError::InvalidArguments(format!("cannot start {} jobs: {}", opts.jobs, e))
        })?;

    for &kind in Kind::ALL {
        let mut group: Vec<&ManifestEntry> = entries
            .iter()
            .filter(|e| e.metadata.kind == kind)
            .collect();
        if group.is_empty() {
            continue;
        }
        if !supported.kinds.contains(&kind) {
            log::warn!("skipping {} {} image(s): kind not supported", group.len(), kind);
            summary.skipped += group.len();
            continue;
        }

        // each kind draws its own order from the seed
        shuffle(&mut group, opts.seed.map(|seed| seed ^ u64::from(kind.code())));
        // small groups get fewer sets than jobs
        let mut count = opts.jobs;
        while count > 1 && group.len().div_ceil(count) < count {
            count -= 1;
        }
        let sets = split_set(&group, count)?;
        log::info!(
            "{} {} image(s) of kind {} in {} set(s)",
            match opts.operation {
                Operation::Segment => "segmenting",
                Operation::Orientation => "orienting",
            },
            group.len(),
            kind,
            sets.len()
        );

        let logs: Vec<PathBuf> = pool.install(|| {
            sets.par_iter()
                .enumerate()
                .map(|(index, set)| -> Result<PathBuf, SlapsegError> {
                    let path = opts.output_dir.join(format!(
                        "{}-{}-{}.log",
                        opts.operation.log_prefix(),
                        kind.code(),
                        index
                    ));
                    run_set(segmenter, set, &opts.image_dir, opts.operation, &path)?;
                    Ok(path)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        summary.processed += group.len();
        summary.logs.extend(logs);
    }

    Ok(summary)
}

fn run_set<S: Segmenter + ?Sized>(
    segmenter: &S,
    set: &[&ManifestEntry],
    image_dir: &Path,
    operation: Operation,
    log_path: &Path,
) -> Result<(), SlapsegError> {
    match operation {
        Operation::Segment => {
            let mut out = SegmentLog::create(log_path)?;
            for entry in set {
                match load(entry, image_dir)? {
                    Ok(image) => {
                        let start = Instant::now();
                        let segmentation = segmenter.segment(&image);
                        let elapsed = start.elapsed();
                        log::debug!("{}: {}", entry.name, segmentation.status);
                        out.record(&entry.name, elapsed, &image, &segmentation)?;
                    }
                    Err(status) => {
                        out.record_without_positions(
                            &entry.name,
                            Duration::ZERO,
                            entry.metadata.orientation,
                            &status,
                        )?;
                    }
                }
            }
            out.finish()?;
        }
        Operation::Orientation => {
            let mut out = OrientationLog::create(log_path)?;
            for entry in set {
                match load(entry, image_dir)? {
                    Ok(image) => {
                        let start = Instant::now();
                        let (status, orientation) = segmenter.determine_orientation(&image);
                        let elapsed = start.elapsed();
                        log::debug!("{}: {} {}", entry.name, status, orientation);
                        out.record(&entry.name, elapsed, &status, orientation)?;
                    }
                    Err(status) => {
                        out.record(
                            &entry.name,
                            Duration::ZERO,
                            &status,
                            entry.metadata.orientation,
                        )?;
                    }
                }
            }
            out.finish()?;
        }
    }
    Ok(())
}

/// Loads one image. The outer error aborts the batch; the inner one is a
/// status to log for an image whose bytes do not fit its metadata.
fn load(
    entry: &ManifestEntry,
    image_dir: &Path,
) -> Result<Result<SlapImage, ReturnStatus>, SlapsegError> {
    match entry.load(image_dir) {
        Ok(image) => Ok(Ok(image)),
        Err(SlapsegError::Image { name, source }) => {
            log::warn!("{}: {}", name, source);
            Ok(Err(ReturnStatus::invalid_image_data(source.to_string())))
        }
        Err(other) => Err(other),
    }
}

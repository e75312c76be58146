//! Slapseg: slap fingerprint segmentation.
//!
//! A slap image captures several fingers placed on a scanner platen at
//! once. Slapseg locates each finger impression, bounds it with a
//! quadrilateral, and labels it with its anatomical position.
//!
//! # Modules
//!
//! - [`model`]: Images, finger positions, results and status types
//! - [`engine`]: The [`Segmenter`](engine::Segmenter) interface and its implementation
//! - [`config`]: Engine configuration loaded from a configuration directory
//! - [`validation`]: Conformance checks of segmentation output
//! - [`io`]: Raw images, manifests, CSV logs and JSON output
//! - [`batch`]: Manifest-driven batch runs
//! - [`error`]: Error types for slapseg operations

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use engine::{Segmenter, SlapSegmenter};
use io::ImageMetadata;
use model::{CaptureTechnology, Kind, Orientation, API_VERSION};

pub use error::SlapsegError;

/// The slapseg CLI application.
#[derive(Parser)]
#[command(name = "slapseg")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the identification of the segmentation engine.
    Identify(EngineArgs),
    /// List the slap kinds and features the engine supports.
    Supported(EngineArgs),
    /// Segment the fingers of one raw image.
    Segment(SegmentArgs),
    /// Determine which hand one raw image shows.
    Orient(OrientArgs),
    /// Segment or orient every image listed in a manifest, writing CSV logs.
    Batch(BatchArgs),
}

/// Arguments shared by every command that builds an engine.
#[derive(clap::Args)]
struct EngineArgs {
    /// Directory holding slapseg.yaml; defaults are used when absent.
    #[arg(long, env = "SLAPSEG_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    output: String,
}

/// A raw image file and the metadata it does not record.
#[derive(clap::Args)]
struct ImageArgs {
    /// Raw 8-bit grayscale image, row-major, no header.
    image: PathBuf,

    #[arg(long)]
    width: u16,

    #[arg(long)]
    height: u16,

    /// Resolution in pixels per inch.
    #[arg(long)]
    ppi: u16,

    /// Slap kind (TwoInch, ThreeInch, UpperPalm, FullPalm or a numeric code).
    #[arg(long)]
    kind: Kind,

    /// Capture technology (Unknown, ScannedInkOnPaper, OpticalTirBright).
    #[arg(long, default_value = "Unknown")]
    capture_technology: CaptureTechnology,
}

impl ImageArgs {
    fn metadata(&self, orientation: Orientation) -> ImageMetadata {
        ImageMetadata {
            width: self.width,
            height: self.height,
            ppi: self.ppi,
            kind: self.kind,
            capture_technology: self.capture_technology,
            orientation,
        }
    }
}

/// Arguments for the segment subcommand.
#[derive(clap::Args)]
struct SegmentArgs {
    #[command(flatten)]
    image: ImageArgs,

    /// Hand shown in the image (Right, Left or Thumbs).
    #[arg(long)]
    orientation: Orientation,

    #[command(flatten)]
    engine: EngineArgs,

    /// Check the result for conformance and fail on errors.
    #[arg(long)]
    validate: bool,

    /// With --validate, treat warnings as errors.
    #[arg(long, requires = "validate")]
    strict: bool,
}

/// Arguments for the orient subcommand.
#[derive(clap::Args)]
struct OrientArgs {
    #[command(flatten)]
    image: ImageArgs,

    #[command(flatten)]
    engine: EngineArgs,
}

/// Arguments for the batch subcommand.
#[derive(clap::Args)]
struct BatchArgs {
    /// CSV manifest: name,width,height,ppi,kind,capture_technology,orientation
    #[arg(long)]
    manifest: PathBuf,

    /// Directory manifest names are relative to.
    #[arg(long)]
    image_dir: PathBuf,

    /// Directory receiving the logs.
    #[arg(long)]
    output_dir: PathBuf,

    /// Number of image sets processed in parallel.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Seed for the image order, for reproducible logs.
    #[arg(long)]
    seed: Option<u64>,

    /// Determine orientation instead of segmenting.
    #[arg(long)]
    orientation_only: bool,

    /// Directory holding slapseg.yaml; defaults are used when absent.
    #[arg(long, env = "SLAPSEG_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

/// Run the slapseg CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SlapsegError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Identify(args)) => run_identify(args),
        Some(Commands::Supported(args)) => run_supported(args),
        Some(Commands::Segment(args)) => run_segment(args),
        Some(Commands::Orient(args)) => run_orient(args),
        Some(Commands::Batch(args)) => run_batch(args),
        None => {
            println!("slapseg {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Slap fingerprint segmentation.");
            println!();
            println!("Run 'slapseg --help' for usage information.");
            Ok(())
        }
    }
}

fn build_segmenter(config_dir: Option<&Path>) -> Result<SlapSegmenter, SlapsegError> {
    match config_dir {
        Some(dir) => SlapSegmenter::from_config_dir(dir),
        None => Ok(SlapSegmenter::default()),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), SlapsegError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute the identify subcommand.
fn run_identify(args: EngineArgs) -> Result<(), SlapsegError> {
    let segmenter = build_segmenter(args.config_dir.as_deref())?;
    let identification = segmenter.identification();

    if args.output == "json" {
        return print_json(&serde_json::json!({
            "identification": identification,
            "api_version": API_VERSION,
        }));
    }
    println!("{}", identification);
    println!("API version {}", API_VERSION);
    Ok(())
}

/// Execute the supported subcommand.
fn run_supported(args: EngineArgs) -> Result<(), SlapsegError> {
    let segmenter = build_segmenter(args.config_dir.as_deref())?;
    let supported = segmenter.supported();

    if args.output == "json" {
        return print_json(&supported);
    }
    for kind in &supported.kinds {
        println!("{} ({})", kind, kind.code());
    }
    println!(
        "orientation determination: {}",
        if supported.determines_orientation {
            "yes"
        } else {
            "no"
        }
    );
    Ok(())
}

/// Execute the segment subcommand.
fn run_segment(args: SegmentArgs) -> Result<(), SlapsegError> {
    let segmenter = build_segmenter(args.engine.config_dir.as_deref())?;
    let image = io::read_slap_image(&args.image.image, &args.image.metadata(args.orientation))?;

    let segmentation = segmenter.segment(&image);

    let report = args.validate.then(|| {
        let opts = validation::ValidateOptions {
            strict: args.strict,
            ..Default::default()
        };
        validation::validate_segmentation(&image, &segmentation, &opts)
    });

    if args.engine.output == "json" {
        io::write_segmentation_json(std::io::stdout().lock(), &segmentation)?;
    } else {
        println!("status: {}", segmentation.status);
        for position in &segmentation.positions {
            println!("  {}", position);
        }
        if let Some(report) = &report {
            println!();
            print!("{}", report);
        }
    }

    let status = &segmentation.status;
    if !status.code().returns_positions() {
        return Err(SlapsegError::Segmentation {
            code: status.code(),
            message: status.message().to_string(),
        });
    }

    match report {
        Some(report) if !report.is_ok() => Err(SlapsegError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        }),
        _ => Ok(()),
    }
}

/// Execute the orient subcommand.
fn run_orient(args: OrientArgs) -> Result<(), SlapsegError> {
    let segmenter = build_segmenter(args.engine.config_dir.as_deref())?;
    let metadata = args.image.metadata(Orientation::default());
    let image = io::read_slap_image(&args.image.image, &metadata)?;

    let (status, orientation) = segmenter.determine_orientation(&image);

    if args.engine.output == "json" {
        return print_json(&serde_json::json!({
            "status": status,
            "orientation": orientation,
        }));
    }
    println!("status: {}", status);
    println!("orientation: {}", orientation);
    Ok(())
}

/// Execute the batch subcommand.
fn run_batch(args: BatchArgs) -> Result<(), SlapsegError> {
    let segmenter = build_segmenter(args.config_dir.as_deref())?;
    let entries = io::manifest::read_manifest(&args.manifest)?;

    let opts = batch::BatchOptions {
        image_dir: args.image_dir,
        output_dir: args.output_dir,
        jobs: args.jobs,
        seed: args.seed,
        operation: if args.orientation_only {
            batch::Operation::Orientation
        } else {
            batch::Operation::Segment
        },
    };
    let summary = batch::run_batch(&segmenter, &entries, &opts)?;

    println!(
        "Processed {} image(s), skipped {}; wrote {} log(s) to {}",
        summary.processed,
        summary.skipped,
        summary.logs.len(),
        opts.output_dir.display()
    );
    for path in &summary.logs {
        println!("  {}", path.display());
    }
    Ok(())
}

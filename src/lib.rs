//! Cocotile: tile geospatial annotations into COCO datasets.
//!
//! Cocotile converts vector annotations (polygons tagged with a class)
//! overlaid on a large georeferenced raster into a tiled
//! object-detection/segmentation dataset: fixed-size image tiles plus
//! per-tile run-length-encoded instance masks, bounding boxes and areas,
//! aggregated into one growable, semantically-versioned JSON document.
//! Repeated runs against the same document are composable: categories are
//! reconciled without renumbering, sources are registered once, and the
//! version string records what changed.
//!
//! # Modules
//!
//! - [`tiling`]: tile schema, schema selection, and the deterministic
//!   window grid
//! - [`mask`]: all-touched rasterization and COCO RLE encoding
//! - [`dataset`]: the incremental dataset aggregate and its JSON document
//! - [`pipeline`]: the per-run ingestion flow over a [`raster::RasterSource`]
//! - [`geom`], [`raster`], [`labels`]: the external-collaborator interfaces
//! - [`validation`]: dataset document validation and error reporting
//! - [`error`]: error types for cocotile operations

pub mod dataset;
pub mod error;
pub mod geom;
pub mod labels;
pub mod mask;
pub mod pipeline;
pub mod raster;
pub mod tiling;
pub mod validation;

use std::path::PathBuf;

use chrono::Datelike;
use clap::{Parser, Subcommand};

pub use error::CocotileError;

/// The cocotile CLI application.
#[derive(Parser)]
#[command(name = "cocotile")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create an empty dataset document at version 0.0.0.
    New(NewArgs),
    /// Copy a dataset document, optionally updating its metadata.
    Copy(CopyArgs),
    /// Validate a dataset document for errors and warnings.
    Validate(ValidateArgs),
}

/// Arguments for the new subcommand.
#[derive(clap::Args)]
struct NewArgs {
    /// Path for the new dataset document.
    json_path: PathBuf,

    /// Dataset description.
    #[arg(long, default_value = "")]
    description: String,

    /// Main contributor of the dataset, its images and its annotations.
    #[arg(long, default_value = "")]
    contributor: String,
}

/// Arguments for the copy subcommand.
#[derive(clap::Args)]
struct CopyArgs {
    /// Path to the input dataset document.
    source_path: PathBuf,

    /// Path for the output dataset document.
    dest_path: PathBuf,

    /// Replace the version string.
    #[arg(long = "set-version")]
    set_version: Option<String>,

    /// Replace the description.
    #[arg(long)]
    description: Option<String>,

    /// Replace the contributor.
    #[arg(long)]
    contributor: Option<String>,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Dataset document to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the cocotile CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocotileError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::New(args)) => run_new(args),
        Some(Commands::Copy(args)) => run_copy(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("cocotile {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Tile geospatial annotations into COCO datasets.");
            println!();
            println!("Run 'cocotile --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the new subcommand.
fn run_new(args: NewArgs) -> Result<(), CocotileError> {
    let now = chrono::Utc::now();
    let dataset = dataset::create_dataset(
        args.description,
        args.contributor,
        Some(now.year()),
        Some(now.to_rfc3339()),
    );
    dataset::save_dataset(&dataset, &args.json_path)?;
    println!("Created new dataset at {}", args.json_path.display());
    Ok(())
}

/// Execute the copy subcommand.
fn run_copy(args: CopyArgs) -> Result<(), CocotileError> {
    let mut dataset = dataset::load_dataset(&args.source_path)?;

    let updating =
        args.set_version.is_some() || args.description.is_some() || args.contributor.is_some();
    if let Some(version) = args.set_version {
        // reject malformed replacements before they poison later bumps
        version.parse::<dataset::Version>()?;
        dataset.info.version = version;
    }
    if let Some(description) = args.description {
        dataset.info.description = Some(description);
    }
    if let Some(contributor) = args.contributor {
        dataset.info.contributor = Some(contributor);
    }
    if updating {
        let now = chrono::Utc::now();
        dataset.info.date_created = Some(now.to_rfc3339());
        dataset.info.year = Some(now.year());
    }

    dataset::save_dataset(&dataset, &args.dest_path)?;
    println!("Copied dataset to {}", args.dest_path.display());
    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), CocotileError> {
    let dataset = dataset::load_dataset(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_dataset(&dataset, &opts);

    match args.output.as_str() {
        "json" => {
            let issues: Vec<serde_json::Value> = report
                .issues
                .iter()
                .map(|issue| {
                    serde_json::json!({
                        "severity": format!("{:?}", issue.severity),
                        "code": format!("{:?}", issue.code),
                        "message": issue.message,
                        "context": issue.context.to_string(),
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": issues,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&doc).expect("report serializes")
            );
        }
        _ => {
            print!("{}", report);
        }
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(CocotileError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

use std::path::PathBuf;
use thiserror::Error;

use crate::tiling::SchemaError;
use crate::validation::ValidationReport;

/// The main error type for cocotile operations.
#[derive(Debug, Error)]
pub enum CocotileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dataset document from {path}: {source}")]
    DatasetParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write dataset document to {path}: {source}")]
    DatasetWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid semantic version string '{0}' (expected MAJOR.MINOR.PATCH)")]
    VersionParse(String),

    #[error("No viable tile schema for any candidate window in {candidates:?}")]
    NoViableSchema {
        candidates: Vec<(u32, u32)>,
        #[source]
        source: SchemaError,
    },

    #[error("Projection of raster ({raster}) and labels ({labels}) don't match")]
    CrsMismatch { raster: String, labels: String },

    #[error("No spatial overlap between raster extent and label extent")]
    NoOverlap,

    #[error("At least one of category ids or category names must be given")]
    MissingCategoryInput,

    #[error("Category ids ({ids}) and names ({names}) differ in length")]
    CategoryLengthMismatch { ids: usize, names: usize },

    #[error("Supercategories ({supers}) don't align with proposed categories ({proposed})")]
    SupercategoryLengthMismatch { supers: usize, proposed: usize },

    #[error("Category id {id} proposed with conflicting names '{first}' and '{second}'")]
    CategoryConflict {
        id: u64,
        first: String,
        second: String,
    },

    #[error("Label {index} carries neither a category id nor a category name")]
    MissingCategoryAttribute { index: usize },

    #[error("Raster source '{0}' is closed")]
    RasterClosed(String),

    #[error("Unsupported band count {0} for tile artifacts (expected 1 or 3)")]
    UnsupportedBandCount(u32),

    #[error("Failed to encode tile artifact {path}: {source}")]
    ArtifactEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

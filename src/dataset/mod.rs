//! The incremental dataset aggregate and its persisted document form.
//!
//! [`Dataset`] is the growable COCO-style document; [`io_json`] persists
//! it; [`Version`] implements the three-tier bump policy the aggregate
//! applies per ingestion run.

mod aggregate;
mod ids;
pub mod io_json;
mod model;
mod version;

pub use aggregate::Dataset;
pub use ids::{AnnotationId, CategoryId, ImageId, SourceId};
pub use io_json::{create_dataset, load_dataset, save_dataset};
pub use model::{Annotation, Category, Image, Info, RleSeg, Source};
pub use version::{Version, VersionTier};

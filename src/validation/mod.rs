//! Dataset document validation.
//!
//! Checks the structural invariants the aggregate relies on when a document
//! comes back from disk: unique IDs, valid references, sane dimensions, a
//! parseable version string, and segmentation payloads that agree with
//! their images. Validation reports issues instead of failing fast: a
//! corrupt document should be diagnosable in one pass.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::dataset::{
    AnnotationId, CategoryId, Dataset, ImageId, SourceId, Version,
};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors at the CLI boundary.
    pub strict: bool,
}

/// Validates a dataset document and returns a report of all issues found.
pub fn validate_dataset(dataset: &Dataset, _opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_info(dataset, &mut report);
    validate_sources(dataset, &mut report);
    validate_categories(dataset, &mut report);

    let image_dims = validate_images(dataset, &mut report);
    validate_annotations(dataset, &image_dims, &mut report);

    report
}

fn validate_info(dataset: &Dataset, report: &mut ValidationReport) {
    if dataset.info.version.parse::<Version>().is_err() {
        report.add(ValidationIssue::error(
            IssueCode::InvalidVersion,
            format!("Version '{}' is not MAJOR.MINOR.PATCH", dataset.info.version),
            IssueContext::Dataset,
        ));
    }
}

fn validate_sources(dataset: &Dataset, report: &mut ValidationReport) {
    let mut seen_ids: HashSet<SourceId> = HashSet::new();
    let mut seen_files: HashSet<&PathBuf> = HashSet::new();

    for source in &dataset.sources {
        let id = source.id.as_u64();
        if !seen_ids.insert(source.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateSource,
                format!("Duplicate source ID {}", id),
                IssueContext::Source { id },
            ));
        }
        if !seen_files.insert(&source.file_name) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateSource,
                format!(
                    "Source file '{}' registered more than once",
                    source.file_name.display()
                ),
                IssueContext::Source { id },
            ));
        }
    }
}

fn validate_categories(dataset: &Dataset, report: &mut ValidationReport) {
    let mut seen_ids: HashSet<CategoryId> = HashSet::new();
    let mut seen_names: HashMap<&str, CategoryId> = HashMap::new();

    for category in &dataset.categories {
        let id = category.id.as_u64();

        if !seen_ids.insert(category.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryId,
                format!("Duplicate category ID {}", id),
                IssueContext::Category { id },
            ));
        }

        if category.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyCategoryName,
                "Empty category name",
                IssueContext::Category { id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryName,
                format!(
                    "Duplicate category name '{}' (also used by category {})",
                    category.name, first_id
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_names.insert(&category.name, category.id);
        }
    }
}

/// Validates images and returns their dimensions for annotation checks.
fn validate_images(
    dataset: &Dataset,
    report: &mut ValidationReport,
) -> HashMap<ImageId, (u32, u32)> {
    let source_ids: HashSet<SourceId> = dataset.sources.iter().map(|s| s.id).collect();
    let mut seen_ids: HashSet<ImageId> = HashSet::new();
    let mut dims = HashMap::new();

    for image in &dataset.images {
        let id = image.id.as_u64();

        if !seen_ids.insert(image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!("Duplicate image ID {}", id),
                IssueContext::Image { id },
            ));
        } else {
            dims.insert(image.id, (image.width, image.height));
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }

        if image.file_name.as_os_str().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFileName,
                "Empty file name",
                IssueContext::Image { id },
            ));
        }

        if !source_ids.contains(&image.source_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingSourceRef,
                format!("References non-existent source {}", image.source_id),
                IssueContext::Image { id },
            ));
        }
    }

    dims
}

fn validate_annotations(
    dataset: &Dataset,
    image_dims: &HashMap<ImageId, (u32, u32)>,
    report: &mut ValidationReport,
) {
    let category_ids: HashSet<CategoryId> = dataset.categories.iter().map(|c| c.id).collect();
    let mut seen_ids: HashSet<AnnotationId> = HashSet::new();

    for annotation in &dataset.annotations {
        let id = annotation.id.as_u64();

        if !seen_ids.insert(annotation.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!("Duplicate annotation ID {}", id),
                IssueContext::Annotation { id },
            ));
        }

        if !category_ids.contains(&annotation.category_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingCategoryRef,
                format!("References non-existent category {}", annotation.category_id),
                IssueContext::Annotation { id },
            ));
        }

        let dims = image_dims.get(&annotation.image_id);
        if dims.is_none() {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageRef,
                format!("References non-existent image {}", annotation.image_id),
                IssueContext::Annotation { id },
            ));
        }

        if let Some(&(width, height)) = dims {
            // COCO RLE size is [height, width]
            if annotation.segmentation.size != [height, width] {
                report.add(ValidationIssue::error(
                    IssueCode::SegmentationSizeMismatch,
                    format!(
                        "RLE size {:?} disagrees with image dimensions {}x{}",
                        annotation.segmentation.size, width, height
                    ),
                    IssueContext::Annotation { id },
                ));
            }

            let [x, y, w, h] = annotation.bbox;
            if w <= 0.0 || h <= 0.0 {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidBBoxArea,
                    format!("Bounding box {}x{} has no area", w, h),
                    IssueContext::Annotation { id },
                ));
            } else if x < 0.0 || y < 0.0 || x + w > width as f64 || y + h > height as f64 {
                report.add(ValidationIssue::error(
                    IssueCode::BBoxOutOfBounds,
                    format!(
                        "Bounding box [{}, {}, {}, {}] exceeds image {}x{}",
                        x, y, w, h, width, height
                    ),
                    IssueContext::Annotation { id },
                ));
            }
        }
    }
}

//! Validation report types for structured error reporting.
//!
//! Rich, structured validation results that can be displayed to users,
//! written to files, or processed programmatically.

use std::fmt;

/// The result of validating a dataset document.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Doesn't block ingestion but may indicate problems.
    Warning,
    /// Invalid or corrupt document data.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // ID uniqueness
    /// Multiple images share an ID.
    DuplicateImageId,
    /// Multiple annotations share an ID.
    DuplicateAnnotationId,
    /// Multiple categories share an ID.
    DuplicateCategoryId,
    /// Multiple sources share an ID or file name.
    DuplicateSource,

    // References
    /// An annotation references a non-existent image.
    MissingImageRef,
    /// An annotation references a non-existent category.
    MissingCategoryRef,
    /// An image references a non-existent source.
    MissingSourceRef,

    // Images
    /// An image has zero dimensions.
    InvalidImageDimensions,
    /// An image has an empty file name.
    EmptyFileName,

    // Categories
    /// A category has an empty name.
    EmptyCategoryName,
    /// Multiple categories share a name.
    DuplicateCategoryName,

    // Info
    /// The stored version string doesn't parse as MAJOR.MINOR.PATCH.
    InvalidVersion,

    // Annotations
    /// RLE `size` disagrees with the referenced image's dimensions.
    SegmentationSizeMismatch,
    /// A bounding box extends outside its image.
    BBoxOutOfBounds,
    /// A bounding box has zero or negative extent.
    InvalidBBoxArea,
}

/// Context about where a validation issue occurred.
#[derive(Clone, Debug)]
pub enum IssueContext {
    Dataset,
    Image { id: u64 },
    Annotation { id: u64 },
    Category { id: u64 },
    Source { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Dataset => write!(f, "dataset"),
            IssueContext::Image { id } => write!(f, "image {}", id),
            IssueContext::Annotation { id } => write!(f, "annotation {}", id),
            IssueContext::Category { id } => write!(f, "category {}", id),
            IssueContext::Source { id } => write!(f, "source {}", id),
        }
    }
}

//! Error and warning taxonomy.
//!
//! Errors abort one sheet (or one layout generation). Warnings are non-fatal
//! and accumulate on the result so a batch yields one report per sheet.

use std::path::PathBuf;

/// Registry document could not be read or is not well-formed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed registry document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sheet layout parameters are unusable.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("unsupported sheet schema '{found}' (expected '{expected}')")]
    Schema {
        found: String,
        expected: &'static str,
    },
    #[error("invalid sheet layout: {0}")]
    Invalid(String),
    #[error("failed to read sheet layout {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed sheet layout: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal failure of one sheet's scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Registry(#[from] ParseError),
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sheet exceeded its {budget_ms} ms budget during {stage}")]
    Timeout { budget_ms: u64, stage: &'static str },
    #[error("invalid scan config: {0}")]
    Config(String),
}

impl ScanError {
    /// Stable code used in batch reports.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Registry(_) => "parse_error",
            Self::ImageLoad { .. } => "image_load_failure",
            Self::Timeout { .. } => "timeout",
            Self::Config(_) => "invalid_config",
        }
    }
}

/// Non-fatal condition recorded during layout or scan.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetWarning {
    /// More questions were requested than `columns * rows_per_column`.
    CapacityExceeded {
        requested: usize,
        capacity: usize,
        omitted: usize,
    },
    /// Rows of a column would cross the bottom page margin and were dropped.
    PageOverflow {
        column: usize,
        first_omitted_question: u32,
        omitted: usize,
    },
    /// A question's observed option group has the wrong size; the question
    /// is excluded from the results.
    StructuralMismatch {
        question_num: u32,
        observed: usize,
        expected: usize,
    },
}

impl SheetWarning {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::PageOverflow { .. } => "page_overflow",
            Self::StructuralMismatch { .. } => "structural_mismatch",
        }
    }
}

impl std::fmt::Display for SheetWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
                omitted,
            } => write!(
                f,
                "{}: {requested} questions requested but the sheet holds {capacity}; {omitted} omitted",
                self.code()
            ),
            Self::PageOverflow {
                column,
                first_omitted_question,
                omitted,
            } => write!(
                f,
                "{}: column {column} runs past the bottom margin; {omitted} questions from Q{first_omitted_question} omitted",
                self.code()
            ),
            Self::StructuralMismatch {
                question_num,
                observed,
                expected,
            } => write!(
                f,
                "{}: question {question_num} has {observed} options instead of {expected}; skipped",
                self.code()
            ),
        }
    }
}

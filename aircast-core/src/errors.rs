//! Error Types for Dataset Loading
//!
//! Training failures are fatal by design: the bridge cannot enter its
//! serving loop without a fitted model, so there is no partial-failure
//! mode and no recovery path here. Errors carry enough context to name
//! the offending file location in the startup log and nothing more.

use thiserror::Error;

/// Result type for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised while loading the training CSV
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Underlying file read failed
    #[error("failed to read training data: {0}")]
    Io(#[from] std::io::Error),

    /// File is empty or has no header row
    #[error("training data has no header row")]
    MissingHeader,

    /// A required column is absent from the header
    #[error("training data is missing column '{0}'")]
    MissingColumn(&'static str),

    /// A data row could not be parsed
    #[error("bad value in row {row}, column '{column}': {value:?}")]
    BadField {
        /// 1-based row number, counting the header as row 1
        row: usize,
        /// Column the bad value appeared in
        column: &'static str,
        /// The raw field text
        value: String,
    },

    /// A data row is shorter than the header
    #[error("row {row} has {found} fields, expected {expected}")]
    ShortRow {
        /// 1-based row number, counting the header as row 1
        row: usize,
        /// Fields found in the row
        found: usize,
        /// Fields declared by the header
        expected: usize,
    },
}

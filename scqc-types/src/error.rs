use thiserror::Error;

/// Errors surfaced by the container and the QC routines built on it.
///
/// Every condition is detected eagerly, before any metadata column is
/// written, so a failed call leaves the container untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QcError {
    #[error("unknown assay: {0}")]
    UnknownAssay(String),

    #[error("assay already present: {0}")]
    DuplicateAssay(String),

    #[error("assay '{name}' has shape ({rows}, {cols}), expected ({expected_rows}, {expected_cols})")]
    AssayShape {
        name: String,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("control set '{set}' references index {index} but only {len} entries exist")]
    UnknownControlSet { set: String, index: usize, len: usize },

    #[error("duplicate control set name: {0}")]
    DuplicateControlSet(String),

    #[error("column '{name}' has {actual} rows, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} out of range for {axis} axis of length {len}")]
    IndexOutOfBounds {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    #[error("unknown metadata column: {0}")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("invalid MAD threshold: {0}")]
    InvalidThreshold(f64),
}

use thiserror::Error;

use crate::category::DataCategory;
use crate::fetch::ArchiveFailure;

/// Validation errors raised before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid calendar date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: String, end: String },

    #[error("invalid data category '{value}', expected one of {expected}")]
    InvalidCategory { value: String, expected: String },
    #[error("invalid market segment '{value}', expected one of spot, um-futures")]
    InvalidMarketSegment { value: String },

    #[error("concurrency must be greater than zero")]
    InvalidConcurrency,

    #[error("category descriptor must declare at least one column")]
    EmptyColumns,
    #[error("timestamp column '{column}' is not part of the declared columns")]
    TimestampColumnMissing { column: String },
}

/// Top-level error for a download run.
///
/// Per-archive problems never appear here; they are collected into the
/// outcome's failure list instead. Only conditions that admit no meaningful
/// partial result are raised.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("data category '{category}' is not registered")]
    UnregisteredCategory { category: DataCategory },

    #[error("all {requested} requested archives failed to download")]
    TotalFailure {
        requested: usize,
        failures: Vec<ArchiveFailure>,
    },
}

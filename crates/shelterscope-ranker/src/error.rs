//! Error types for the scoring core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankerError>;

#[derive(Debug, Error)]
pub enum RankerError {
    #[error("Pairwise matrix must be square and non-empty: {rows} rows, row {row} has {cols} columns")]
    InvalidMatrixShape { rows: usize, row: usize, cols: usize },

    #[error("Pairwise matrix diagonal must be 1.0: entry [{index}][{index}] = {value}")]
    InvalidMatrixDiagonal { index: usize, value: f64 },

    #[error("Pairwise matrix is not reciprocal: [{i}][{j}] = {a_ij}, [{j}][{i}] = {a_ji}")]
    NonReciprocalMatrix { i: usize, j: usize, a_ij: f64, a_ji: f64 },

    #[error("Criteria count mismatch: matrix is {expected}x{expected}, got {actual} criterion names")]
    CriteriaCountMismatch { expected: usize, actual: usize },

    #[error("Duplicate criterion name: {0}")]
    DuplicateCriterion(String),

    #[error("Weights file not found: {0}")]
    WeightsFileNotFound(String),

    #[error("Malformed weights file {path}: {reason}")]
    MalformedWeightsFile { path: String, reason: String },

    #[error("Criterion column '{0}' not found in site table")]
    MissingCriterionColumn(String),

    #[error("Criterion column '{column}' must be numeric (site '{site}')")]
    NonNumericCriterion { column: String, site: String },

    #[error("Normalizing '{column}' gave a non-finite value for site '{site}'")]
    NonFiniteNormalized { column: String, site: String },

    #[error("Duplicate site id '{id}' (rows {first} and {second})")]
    DuplicateSite { id: String, first: usize, second: usize },

    #[error("Missing normalized column: {0}")]
    MissingNormalizedColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

//! Evaluation errors.

use adaptive_storage::StorageError;

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvaluationError>;

/// Evaluation errors.
///
/// Missing samples are not an error; they exclude an adaptation from the
/// report instead.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// History could not be read
    #[error("history unavailable: {0}")]
    Storage(#[from] StorageError),

    /// A trend window with a non-positive bucket size or reversed bounds
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// Evaluator settings that cannot produce a score
    #[error("invalid evaluator config: {0}")]
    InvalidConfig(String),
}

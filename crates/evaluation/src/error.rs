//! Evaluation errors.

use teamform_algorithm::TeamFormationError;
use teamform_storage::StorageError;
use thiserror::Error;

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvaluationError>;

/// Errors that abort an evaluation run.
///
/// A pipeline failing on one task is not among them; it becomes a failed
/// record and the run continues.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Engine could not be set up
    #[error(transparent)]
    Algorithm(#[from] TeamFormationError),

    /// Report could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing to evaluate
    #[error("no tasks to evaluate")]
    NoTasks,

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

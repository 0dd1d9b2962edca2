//! Storage trait abstraction.

use std::path::PathBuf;

use async_trait::async_trait;
use teamform_core::{GraphError, ModelError};

use crate::dataset::{Dataset, DatasetFile, TaskSpec};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Normalization pattern failed to compile
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Records violate the data model
    #[error("invalid entity data: {0}")]
    Model(#[from] ModelError),

    /// Edges violate the graph contract
    #[error("invalid graph data: {0}")]
    Graph(#[from] GraphError),

    /// Records are inconsistent with each other
    #[error("invalid dataset: {0}")]
    Invalid(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Storage abstraction for datasets, task suites and evaluation reports.
///
/// This trait allows different storage backends to be plugged in.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    // === Dataset ===

    /// Load and validate the dataset.
    async fn load_dataset(&self) -> Result<Dataset>;

    /// Save raw dataset records.
    async fn save_dataset(&self, file: &DatasetFile) -> Result<()>;

    // === Tasks ===

    /// Load the task suite, if one was generated.
    async fn load_tasks(&self) -> Result<Option<Vec<TaskSpec>>>;

    /// Replace the task suite.
    async fn save_tasks(&self, tasks: &[TaskSpec]) -> Result<()>;

    // === Reports ===

    /// Save a report under `run_id`; returns where it was written.
    async fn save_report(&self, run_id: &str, report: &serde_json::Value) -> Result<PathBuf>;

    /// Load a report by run id.
    async fn load_report(&self, run_id: &str) -> Result<Option<serde_json::Value>>;

    /// Run ids of all saved reports, oldest first.
    async fn list_reports(&self) -> Result<Vec<String>>;
}

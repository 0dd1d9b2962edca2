//! Evaluation layer - task generation and batch comparison of pipelines.

#![warn(missing_docs)]

mod error;
mod generator;
mod harness;
mod id;
mod metrics;

pub use error::{EvaluationError, Result};
pub use generator::{SuiteConfig, TaskGenerator};
pub use harness::{EvaluationConfig, EvaluationReport, Evaluator};
pub use id::RunId;
pub use metrics::{summarize, EvaluationRecord, TaskStatistics};

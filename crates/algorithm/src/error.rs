//! Error types for team formation.

use teamform_core::{GraphError, Skill};
use thiserror::Error;

/// Result type for team-formation operations.
pub type Result<T> = std::result::Result<T, TeamFormationError>;

/// Errors that stop a query.
///
/// Partial outcomes (incomplete coverage, unreachable terminals) are not
/// errors; they travel inside the returned outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TeamFormationError {
    /// No entity offers any of the required skills.
    #[error("no entity offers any required skill: {}", .required.join(", "))]
    NoCoverage {
        /// The requested skills
        required: Vec<Skill>,
    },

    /// The bridge weight must be a finite positive number.
    #[error("bridge weight must be finite and positive, got {0}")]
    InvalidBridgeWeight(f64),

    /// The bridge weight does not dominate every real path cost.
    #[error("bridge weight {weight} does not exceed total edge weight {bound}")]
    BridgeWeightTooSmall {
        /// Configured bridge weight
        weight: f64,
        /// Sum of all edge weights of the collaboration graph
        bound: f64,
    },

    /// Pipeline name not recognised.
    #[error("unknown pipeline: {0}")]
    UnknownPipeline(String),

    /// The collaboration graph has no nodes.
    #[error("collaboration graph is empty")]
    EmptyGraph,

    /// Graph operation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl TeamFormationError {
    /// Whether the query failed only because nothing covers the requirement.
    pub fn is_no_coverage(&self) -> bool {
        matches!(self, TeamFormationError::NoCoverage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_coverage_display() {
        let error = TeamFormationError::NoCoverage {
            required: vec!["nlp".to_string(), "cv".to_string()],
        };
        assert_eq!(error.to_string(), "no entity offers any required skill: nlp, cv");
        assert!(error.is_no_coverage());
        assert!(!TeamFormationError::EmptyGraph.is_no_coverage());
    }
}

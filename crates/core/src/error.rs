//! Error types for the graph contract and the data model.

use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by [`WeightedGraph`](crate::WeightedGraph) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The two nodes lie in different components.
    #[error("no path between {from} and {to}")]
    NoPath {
        /// Source node
        from: String,
        /// Target node
        to: String,
    },

    /// The node is not part of the graph.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Edge weights must be finite and nonnegative.
    #[error("invalid weight {weight} on edge {u} - {v}")]
    InvalidWeight {
        /// First endpoint
        u: String,
        /// Second endpoint
        v: String,
        /// Rejected weight
        weight: f64,
    },

    /// Edges must join two distinct nodes.
    #[error("self loop on {0}")]
    SelfLoop(String),
}

impl GraphError {
    /// Whether this error only says that two nodes are disconnected.
    pub fn is_no_path(&self) -> bool {
        matches!(self, GraphError::NoPath { .. })
    }
}

/// Errors raised while building the entity/skill model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A skill requirement must name at least one skill.
    #[error("skill requirement is empty")]
    EmptyRequirement,

    /// Entity ids must be unique within a skill map.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    /// Entity ids must be non-blank.
    #[error("entity id is blank")]
    BlankEntityId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_display() {
        let error = GraphError::NoPath {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert_eq!(error.to_string(), "no path between a and b");
        assert!(error.is_no_path());
        assert!(!GraphError::UnknownNode("a".to_string()).is_no_path());
    }

    #[test]
    fn test_model_error_display() {
        assert_eq!(
            ModelError::DuplicateEntity("ada".to_string()).to_string(),
            "duplicate entity: ada"
        );
    }
}

//! Team formation algorithms - greedy skill cover, Steiner tree growth,
//! auxiliary skill graphs, and the pipelines that compose them.
//!
//! Nothing here performs I/O or logs. Degraded results carry structured
//! diagnostics for the caller to report.

#![warn(missing_docs)]

pub mod auxiliary;
pub mod budget;
pub mod cost;
pub mod cover;
pub mod error;
pub mod pipeline;
pub mod steiner;

pub use auxiliary::{AuxNode, AuxiliaryGraph, AuxiliaryGraphBuilder, AuxiliaryVariant, BridgeWeight, UnreachableSkills};
pub use budget::{BudgetTracker, SearchBudget};
pub use cost::{TeamCostEvaluator, TeamEvaluation};
pub use cover::{CoverOutcome, CoverSelector, CoverStrategy, CoverageIncomplete, GraphAwareCover, GreedyCover};
pub use error::{Result, TeamFormationError};
pub use pipeline::{Diagnostic, Pipeline, PipelineConfig, TeamFormationEngine, TeamOutcome};
pub use steiner::{PartialSteinerFailure, SteinerApproximator, SteinerOutcome, SteinerTree, StopReason};

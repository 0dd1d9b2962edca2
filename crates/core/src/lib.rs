//! teamform core data models.
//!
//! This crate defines the entity/skill model and the weighted collaboration
//! graph every team-formation algorithm runs on. It performs no I/O and no
//! logging; records are validated when they are built.

#![warn(missing_docs)]

mod entity;
mod error;
mod graph;
mod team;

pub use entity::{Entity, Skill, SkillMap};
pub use error::{GraphError, ModelError, Result};
pub use graph::{NodeId, Path, ShortestPaths, WeightedGraph};
pub use team::{SkillRequirement, Team};

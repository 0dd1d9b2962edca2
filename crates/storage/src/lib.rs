//! Storage for team-formation datasets.
//!
//! This crate provides a trait-based storage interface with a JSON file
//! implementation, plus validation of dataset records into the graph and
//! skill model at the ingestion boundary.

#![warn(missing_docs)]

pub mod dataset;
pub mod json_storage;
pub mod trait_;

pub use dataset::{Dataset, DatasetFile, EdgeRecord, EntityRecord, SkillNormalizer, TaskSpec};
pub use json_storage::JsonDatasetStore;
pub use trait_::{DatasetStore, Result, StorageError};

//! Dataset records and their validation into the in-memory model.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use teamform_core::{Entity, ModelError, Skill, SkillMap, SkillRequirement, WeightedGraph};
use tracing::{debug, warn};

use crate::trait_::{Result, StorageError};

/// One entity as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity identifier
    pub id: String,
    /// Raw skill labels; normalized on load
    #[serde(default)]
    pub skills: Vec<String>,
    /// Categories the entity published in
    #[serde(default)]
    pub categories: Vec<String>,
    /// Whether the entity is a node of the collaboration graph
    #[serde(default = "default_in_graph")]
    pub in_graph: bool,
}

fn default_in_graph() -> bool {
    true
}

/// One collaboration edge as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// First endpoint
    pub source: String,
    /// Second endpoint
    pub target: String,
    /// Communication cost, finite and nonnegative
    pub weight: f64,
}

/// Contents of `dataset.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    /// Entities in candidate order
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    /// Undirected weighted edges
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// One generated task as stored in `tasks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Number of required skills
    pub t: usize,
    /// Number of categories the skills were drawn from
    pub s: usize,
    /// Required skills
    pub skills: BTreeSet<Skill>,
    /// Categories the skills were drawn from
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl TaskSpec {
    /// The task's skill requirement.
    pub fn requirement(&self) -> std::result::Result<SkillRequirement, ModelError> {
        SkillRequirement::try_from(self.skills.clone())
    }
}

/// Skill label normalizer.
///
/// Bracketed segments are dropped, punctuation becomes whitespace, whitespace
/// runs collapse to one space, and the result is lower-cased and trimmed.
#[derive(Debug, Clone)]
pub struct SkillNormalizer {
    bracketed: Regex,
    punctuation: Regex,
    whitespace: Regex,
}

impl SkillNormalizer {
    /// Compile the normalization patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            bracketed: Regex::new(r"[\(\[\{][^\)\]\}]*[\)\]\}]")?,
            punctuation: Regex::new(r"[^\w\s]")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Normalize a raw label; may return an empty string.
    pub fn normalize(&self, raw: &str) -> String {
        let label = self.bracketed.replace_all(raw.trim(), "");
        let label = self.punctuation.replace_all(&label, " ");
        let label = self.whitespace.replace_all(&label, " ");
        label.to_lowercase().trim().to_string()
    }
}

/// Validated dataset: collaboration graph, skill map and categories.
#[derive(Debug, Clone)]
pub struct Dataset {
    graph: WeightedGraph,
    skills: SkillMap,
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl Dataset {
    /// Validate `file` and build the in-memory model.
    ///
    /// Entities keep their file order. Edge endpoints must be declared
    /// in-graph entities.
    pub fn from_file(file: DatasetFile) -> Result<Self> {
        let normalizer = SkillNormalizer::new()?;
        let mut graph = WeightedGraph::new();
        let mut categories = BTreeMap::new();
        let mut entities = Vec::with_capacity(file.entities.len());

        for record in file.entities {
            let skills: BTreeSet<Skill> = record
                .skills
                .iter()
                .map(|raw| normalizer.normalize(raw))
                .filter(|skill| !skill.is_empty())
                .collect();
            if skills.is_empty() {
                debug!("Entity {} has no usable skills", record.id);
            }
            if record.in_graph {
                graph.add_node(record.id.clone());
            }
            let cats: BTreeSet<String> = record
                .categories
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if !cats.is_empty() {
                categories.insert(record.id.clone(), cats);
            }
            entities.push(Entity {
                id: record.id,
                skills,
            });
        }

        let skills = SkillMap::from_entities(entities)?;

        for edge in file.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !graph.contains_node(endpoint) {
                    return Err(StorageError::Invalid(format!(
                        "edge {} - {} references unknown entity {}",
                        edge.source, edge.target, endpoint
                    )));
                }
            }
            if graph.edge_weight(&edge.source, &edge.target).is_some() {
                warn!("Duplicate edge {} - {}, keeping the last weight", edge.source, edge.target);
            }
            graph.add_edge(edge.source, edge.target, edge.weight)?;
        }

        Ok(Self {
            graph,
            skills,
            categories,
        })
    }

    /// The collaboration graph.
    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    /// Skills of every entity, in file order.
    pub fn skills(&self) -> &SkillMap {
        &self.skills
    }

    /// Categories of `id`.
    pub fn categories_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(id)
    }

    /// Category → union of the skills of in-graph entities in that category.
    pub fn category_skills(&self) -> BTreeMap<String, BTreeSet<Skill>> {
        let mut map: BTreeMap<String, BTreeSet<Skill>> = BTreeMap::new();
        for entity in self.skills.iter().filter(|e| self.graph.contains_node(&e.id)) {
            for category in self.categories.get(&entity.id).into_iter().flatten() {
                map.entry(category.clone())
                    .or_default()
                    .extend(entity.skills.iter().cloned());
            }
        }
        map
    }

    /// Skills held by at least one in-graph entity.
    pub fn graph_skills(&self) -> BTreeSet<Skill> {
        self.skills
            .iter()
            .filter(|e| self.graph.contains_node(&e.id))
            .flat_map(|e| e.skills.iter().cloned())
            .collect()
    }
}

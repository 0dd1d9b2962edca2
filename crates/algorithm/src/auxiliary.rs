//! Auxiliary graph that folds skill coverage into connectivity.
//!
//! Every entity is split into one clique node per skill it holds, joined by
//! zero-weight edges. Every required skill becomes a virtual node tied to the
//! clique nodes offering it with the bridge weight `D`. A Steiner tree over
//! the skill nodes then picks skill holders and the paths between them in one
//! search.
//!
//! `D` has to dominate every real path cost. Otherwise the tree may hop from
//! one skill holder to another through a skill node instead of a real path,
//! and the mapped-back team loses connectivity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use teamform_core::{Skill, SkillMap, SkillRequirement, Team, WeightedGraph};

use crate::error::{Result, TeamFormationError};

/// Node of an [`AuxiliaryGraph`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuxNode {
    /// One skill of one entity
    Clique {
        /// Owning entity
        entity: String,
        /// Skill this node stands for
        skill: Skill,
    },
    /// Virtual node for a required skill
    Skill(Skill),
}

impl AuxNode {
    fn clique(entity: &str, skill: &str) -> Self {
        AuxNode::Clique {
            entity: entity.to_string(),
            skill: skill.to_string(),
        }
    }

    /// The entity behind a clique node.
    pub fn entity(&self) -> Option<&str> {
        match self {
            AuxNode::Clique { entity, .. } => Some(entity),
            AuxNode::Skill(_) => None,
        }
    }
}

impl fmt::Display for AuxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxNode::Clique { entity, skill } => write!(f, "{entity}::{skill}"),
            AuxNode::Skill(skill) => write!(f, "skill::{skill}"),
        }
    }
}

/// Weight of the edges between virtual skill nodes and clique nodes.
///
/// Valid for a graph when it exceeds the graph's total edge weight, which
/// bounds the cost of any real path.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BridgeWeight(f64);

impl BridgeWeight {
    /// Default bridge weight.
    pub const DEFAULT: f64 = 1e9;

    /// Create a bridge weight; must be finite and positive.
    pub fn new(weight: f64) -> Result<Self> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(TeamFormationError::InvalidBridgeWeight(weight));
        }
        Ok(Self(weight))
    }

    /// The raw weight.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether this weight dominates every real path in `graph`.
    pub fn is_valid_for(&self, graph: &WeightedGraph) -> bool {
        self.0 > graph.total_weight()
    }

    /// Fail with [`TeamFormationError::BridgeWeightTooSmall`] unless valid.
    pub fn check(&self, graph: &WeightedGraph) -> Result<()> {
        if self.is_valid_for(graph) {
            Ok(())
        } else {
            Err(TeamFormationError::BridgeWeightTooSmall {
                weight: self.0,
                bound: graph.total_weight(),
            })
        }
    }
}

impl Default for BridgeWeight {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f64> for BridgeWeight {
    type Error = TeamFormationError;

    fn try_from(weight: f64) -> Result<Self> {
        Self::new(weight)
    }
}

impl From<BridgeWeight> for f64 {
    fn from(weight: BridgeWeight) -> Self {
        weight.0
    }
}

/// How entities are wired to each other in the auxiliary graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryVariant {
    /// Every clique node pair across an original edge
    #[default]
    Full,
    /// One representative clique node per entity
    Sparsified,
}

/// Required skills left out of the terminal set because no clique node offers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreachableSkills {
    /// Skills with no holder in the auxiliary graph
    pub skills: BTreeSet<Skill>,
}

/// Builds [`AuxiliaryGraph`]s.
#[derive(Debug, Clone, Copy)]
pub struct AuxiliaryGraphBuilder {
    variant: AuxiliaryVariant,
    bridge_weight: BridgeWeight,
    enforce_bridge_bound: bool,
}

impl Default for AuxiliaryGraphBuilder {
    fn default() -> Self {
        Self::new(AuxiliaryVariant::Full)
    }
}

impl AuxiliaryGraphBuilder {
    /// Builder for `variant` with the default bridge weight, bound enforced.
    pub fn new(variant: AuxiliaryVariant) -> Self {
        Self {
            variant,
            bridge_weight: BridgeWeight::default(),
            enforce_bridge_bound: true,
        }
    }

    /// Set the bridge weight.
    pub fn with_bridge_weight(mut self, weight: BridgeWeight) -> Self {
        self.bridge_weight = weight;
        self
    }

    /// Enable or disable the bridge weight bound check.
    pub fn with_bridge_bound(mut self, enforce: bool) -> Self {
        self.enforce_bridge_bound = enforce;
        self
    }

    /// The configured variant.
    pub fn variant(&self) -> AuxiliaryVariant {
        self.variant
    }

    /// Build the auxiliary graph for `requirement`.
    ///
    /// Only entities present in `graph` get clique nodes. Fails with
    /// [`TeamFormationError::NoCoverage`] when no required skill has a holder.
    pub fn build(
        &self,
        graph: &WeightedGraph,
        skills: &SkillMap,
        requirement: &SkillRequirement,
    ) -> Result<AuxiliaryGraph> {
        if self.enforce_bridge_bound {
            self.bridge_weight.check(graph)?;
        }

        let mut aux = WeightedGraph::new();
        let members: Vec<_> = skills.iter().filter(|entity| graph.contains_node(&entity.id)).collect();

        for entity in &members {
            let nodes: Vec<AuxNode> = entity
                .skills
                .iter()
                .map(|skill| AuxNode::clique(&entity.id, skill))
                .collect();
            for (i, u) in nodes.iter().enumerate() {
                aux.add_node(u.clone());
                for v in &nodes[i + 1..] {
                    aux.add_edge(u.clone(), v.clone(), 0.0)?;
                }
            }
        }

        for (u, v, weight) in graph.edges() {
            let (Some(left), Some(right)) = (skills.skills_of(u), skills.skills_of(v)) else {
                continue;
            };
            match self.variant {
                AuxiliaryVariant::Full => {
                    for a in left {
                        for b in right {
                            aux.add_edge(AuxNode::clique(u, a), AuxNode::clique(v, b), weight)?;
                        }
                    }
                }
                AuxiliaryVariant::Sparsified => {
                    if let (Some(a), Some(b)) = (left.first(), right.first()) {
                        aux.add_edge(AuxNode::clique(u, a), AuxNode::clique(v, b), weight)?;
                    }
                }
            }
        }

        let mut terminals = BTreeSet::new();
        let mut unreachable = BTreeSet::new();
        for skill in requirement.skills() {
            let node = AuxNode::Skill(skill.clone());
            aux.add_node(node.clone());
            for entity in members.iter().filter(|entity| entity.has_skill(skill)) {
                aux.add_edge(node.clone(), AuxNode::clique(&entity.id, skill), self.bridge_weight.value())?;
            }
            if aux.degree(&node) > 0 {
                terminals.insert(node);
            } else {
                unreachable.insert(skill.clone());
            }
        }

        if terminals.is_empty() {
            return Err(TeamFormationError::NoCoverage {
                required: requirement.skills().iter().cloned().collect(),
            });
        }

        Ok(AuxiliaryGraph {
            graph: aux,
            terminals,
            unreachable: (!unreachable.is_empty()).then_some(UnreachableSkills { skills: unreachable }),
        })
    }
}

/// Auxiliary graph plus the terminal set to connect.
#[derive(Debug, Clone)]
pub struct AuxiliaryGraph {
    graph: WeightedGraph<AuxNode>,
    terminals: BTreeSet<AuxNode>,
    unreachable: Option<UnreachableSkills>,
}

impl AuxiliaryGraph {
    /// The auxiliary graph.
    pub fn graph(&self) -> &WeightedGraph<AuxNode> {
        &self.graph
    }

    /// Skill nodes with at least one holder.
    pub fn terminals(&self) -> &BTreeSet<AuxNode> {
        &self.terminals
    }

    /// Required skills nobody in the graph offers.
    pub fn unreachable_skills(&self) -> Option<&UnreachableSkills> {
        self.unreachable.as_ref()
    }

    /// Entities behind the clique nodes in `nodes`.
    pub fn map_back<'a>(&self, nodes: impl IntoIterator<Item = &'a AuxNode>) -> Team {
        nodes.into_iter().filter_map(AuxNode::entity).collect()
    }
}

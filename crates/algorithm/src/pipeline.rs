//! Team-formation pipelines.
//!
//! Each pipeline is a fixed composition of the selectors, the Steiner
//! approximator and the cost evaluator:
//!
//! ```text
//! cover-steiner              plain cover → Steiner(members) → cost
//! graph-aware-cover-steiner  graph-aware cover → Steiner(members) → cost
//! enhanced-steiner           auxiliary(full) → Steiner(skills) → map back → cost
//! improved-enhanced-steiner  relevant entities → auxiliary(sparsified) → Steiner(skills) → map back → cost
//! ```
//!
//! Partial failures are absorbed into [`Diagnostic`]s on the returned outcome.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use teamform_core::{Skill, SkillMap, SkillRequirement, Team, WeightedGraph};

use crate::auxiliary::{
    AuxNode, AuxiliaryGraph, AuxiliaryGraphBuilder, AuxiliaryVariant, BridgeWeight, UnreachableSkills,
};
use crate::budget::SearchBudget;
use crate::cost::{TeamCostEvaluator, TeamEvaluation};
use crate::cover::{CoverSelector, CoverStrategy, CoverageIncomplete, GraphAwareCover, GreedyCover};
use crate::error::{Result, TeamFormationError};
use crate::steiner::{PartialSteinerFailure, SteinerApproximator};

/// The four team-formation pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pipeline {
    /// Plain greedy cover, then connect the members with a Steiner tree
    CoverSteiner,
    /// Distance-aware greedy cover, then connect the members
    GraphAwareCoverSteiner,
    /// One Steiner run over the full auxiliary graph
    EnhancedSteiner,
    /// One Steiner run over the sparsified auxiliary graph of relevant entities
    ImprovedEnhancedSteiner,
}

impl Pipeline {
    /// Every pipeline, in a fixed order.
    pub const ALL: [Pipeline; 4] = [
        Pipeline::CoverSteiner,
        Pipeline::GraphAwareCoverSteiner,
        Pipeline::EnhancedSteiner,
        Pipeline::ImprovedEnhancedSteiner,
    ];

    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::CoverSteiner => "cover-steiner",
            Pipeline::GraphAwareCoverSteiner => "graph-aware-cover-steiner",
            Pipeline::EnhancedSteiner => "enhanced-steiner",
            Pipeline::ImprovedEnhancedSteiner => "improved-enhanced-steiner",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pipeline {
    type Err = TeamFormationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Pipeline::ALL
            .into_iter()
            .find(|pipeline| pipeline.name() == wanted)
            .ok_or_else(|| TeamFormationError::UnknownPipeline(s.to_string()))
    }
}

/// Tunables shared by all pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Weight `D` of the skill bridge edges
    pub bridge_weight: BridgeWeight,
    /// Reject bridge weights that do not exceed the total edge weight
    pub enforce_bridge_bound: bool,
    /// Limits on Steiner tree growth
    #[serde(skip)]
    pub budget: SearchBudget,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bridge_weight: BridgeWeight::default(),
            enforce_bridge_bound: true,
            budget: SearchBudget::default(),
        }
    }
}

impl PipelineConfig {
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

    /// Set the Steiner search budget.
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// Non-fatal conditions met while forming a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The cover left some required skills uncovered
    CoverageIncomplete(CoverageIncomplete),
    /// Steiner growth could not attach every terminal
    PartialSteiner(PartialSteinerFailure<String>),
    /// Required skills absent from the auxiliary graph
    UnreachableSkills(UnreachableSkills),
    /// No entity offers any required skill
    NoCoverage {
        /// The requested skills
        required: Vec<Skill>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
            items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        }
        match self {
            Diagnostic::CoverageIncomplete(c) => write!(f, "cannot cover skills: {}", list(&c.missing)),
            Diagnostic::PartialSteiner(p) => {
                write!(f, "steiner tree incomplete ({}): {}", p.reason, list(&p.unreachable))
            }
            Diagnostic::UnreachableSkills(u) => write!(f, "unconnected skills: {}", list(&u.skills)),
            Diagnostic::NoCoverage { required } => write!(f, "no entity offers any of: {}", list(required)),
        }
    }
}

/// Team, cost and connectivity returned by a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOutcome {
    /// Pipeline that produced the team
    pub pipeline: Pipeline,
    /// Selected entities
    pub team: Team,
    /// Communication cost; infinite when disconnected
    pub cost: f64,
    /// Whether the team is connected in the collaboration graph
    pub connected: bool,
    /// Non-fatal conditions, in the order they were met
    pub diagnostics: Vec<Diagnostic>,
}

impl TeamOutcome {
    fn evaluated(pipeline: Pipeline, team: Team, evaluation: TeamEvaluation, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            pipeline,
            team,
            cost: evaluation.cost,
            connected: evaluation.connected,
            diagnostics,
        }
    }

    fn no_coverage(pipeline: Pipeline, required: Vec<Skill>) -> Self {
        Self {
            pipeline,
            team: Team::new(),
            cost: 0.0,
            connected: false,
            diagnostics: vec![Diagnostic::NoCoverage { required }],
        }
    }

    /// The cost when it is defined.
    pub fn finite_cost(&self) -> Option<f64> {
        self.cost.is_finite().then_some(self.cost)
    }

    /// Whether any pipeline stage reported a degraded result.
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Runs pipelines over one collaboration graph and skill map.
pub struct TeamFormationEngine<'a> {
    graph: &'a WeightedGraph,
    skills: &'a SkillMap,
    config: PipelineConfig,
}

impl<'a> TeamFormationEngine<'a> {
    /// Create an engine; fails on an empty graph.
    pub fn new(graph: &'a WeightedGraph, skills: &'a SkillMap) -> Result<Self> {
        if graph.is_empty() {
            return Err(TeamFormationError::EmptyGraph);
        }
        Ok(Self {
            graph,
            skills,
            config: PipelineConfig::default(),
        })
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `pipeline` with a seeded random source, or an entropy-seeded one.
    pub fn run_seeded(&self, pipeline: Pipeline, requirement: &SkillRequirement, seed: Option<u64>) -> Result<TeamOutcome> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run(pipeline, requirement, &mut rng)
    }

    /// Run `pipeline` for `requirement`.
    ///
    /// Only configuration problems (bridge weight) and graph faults are
    /// errors; missing coverage comes back as an empty, disconnected team.
    pub fn run<R: Rng + ?Sized>(&self, pipeline: Pipeline, requirement: &SkillRequirement, rng: &mut R) -> Result<TeamOutcome> {
        match pipeline {
            Pipeline::CoverSteiner => {
                let selector = CoverStrategy::Plain(GreedyCover::new());
                Ok(self.cover_then_steiner(pipeline, &selector, requirement, rng))
            }
            Pipeline::GraphAwareCoverSteiner => {
                let selector = CoverStrategy::GraphAware(GraphAwareCover::new(self.graph));
                Ok(self.cover_then_steiner(pipeline, &selector, requirement, rng))
            }
            Pipeline::EnhancedSteiner => self.auxiliary_steiner(pipeline, self.skills, AuxiliaryVariant::Full, requirement, rng),
            Pipeline::ImprovedEnhancedSteiner => {
                let relevant = self.skills.filtered(|entity| {
                    self.graph.contains_node(&entity.id) && entity.skills.iter().any(|skill| requirement.contains(skill))
                });
                if relevant.is_empty() {
                    return Ok(TeamOutcome::no_coverage(pipeline, requirement.skills().iter().cloned().collect()));
                }
                self.auxiliary_steiner(pipeline, &relevant, AuxiliaryVariant::Sparsified, requirement, rng)
            }
        }
    }

    fn steiner(&self) -> SteinerApproximator {
        SteinerApproximator::new().with_budget(self.config.budget)
    }

    fn cover_then_steiner<R: Rng + ?Sized>(
        &self,
        pipeline: Pipeline,
        selector: &dyn CoverSelector,
        requirement: &SkillRequirement,
        rng: &mut R,
    ) -> TeamOutcome {
        let mut diagnostics = Vec::new();
        let cover = selector.select(self.skills, requirement);
        if let Some(incomplete) = cover.incomplete.clone() {
            diagnostics.push(Diagnostic::CoverageIncomplete(incomplete));
        }

        let (nodes, failure) = self.steiner().nodes(self.graph, cover.team.members(), rng);
        if let Some(failure) = failure {
            diagnostics.push(Diagnostic::PartialSteiner(failure));
        }

        // Members the tree could not reach stay on the team; the cost
        // evaluation then reports it as disconnected.
        let team: Team = nodes.into_iter().chain(cover.team).collect();
        let evaluation = TeamCostEvaluator::new().evaluate(self.graph, &team);
        TeamOutcome::evaluated(pipeline, team, evaluation, diagnostics)
    }

    fn auxiliary_steiner<R: Rng + ?Sized>(
        &self,
        pipeline: Pipeline,
        skills: &SkillMap,
        variant: AuxiliaryVariant,
        requirement: &SkillRequirement,
        rng: &mut R,
    ) -> Result<TeamOutcome> {
        let builder = AuxiliaryGraphBuilder::new(variant)
            .with_bridge_weight(self.config.bridge_weight)
            .with_bridge_bound(self.config.enforce_bridge_bound);
        let aux = match builder.build(self.graph, skills, requirement) {
            Ok(aux) => aux,
            Err(TeamFormationError::NoCoverage { required }) => {
                return Ok(TeamOutcome::no_coverage(pipeline, required));
            }
            Err(e) => return Err(e),
        };

        let mut diagnostics = Vec::new();
        if let Some(unreachable) = aux.unreachable_skills() {
            diagnostics.push(Diagnostic::UnreachableSkills(unreachable.clone()));
        }

        let outcome = self.steiner().tree(aux.graph(), aux.terminals(), rng);
        if let Some(failure) = outcome.failure {
            diagnostics.push(Diagnostic::PartialSteiner(PartialSteinerFailure {
                unreachable: skill_names(&failure.unreachable),
                reason: failure.reason,
            }));
        }

        let mut nodes = outcome.tree.into_nodes();
        attach_lone_skill_nodes(&aux, &mut nodes);
        let team = aux.map_back(nodes.iter());
        let evaluation = TeamCostEvaluator::new().evaluate(self.graph, &team);
        Ok(TeamOutcome::evaluated(pipeline, team, evaluation, diagnostics))
    }
}

fn skill_names(nodes: &BTreeSet<AuxNode>) -> BTreeSet<String> {
    nodes
        .iter()
        .map(|node| match node {
            AuxNode::Skill(skill) => skill.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// A tree holding a single skill node (one reachable skill) has no clique
/// node yet; pull in that skill's first holder.
fn attach_lone_skill_nodes(aux: &AuxiliaryGraph, nodes: &mut BTreeSet<AuxNode>) {
    let lone: Vec<AuxNode> = nodes
        .iter()
        .filter(|node| matches!(node, AuxNode::Skill(_)))
        .filter(|node| {
            aux.graph()
                .neighbors(node)
                .map(|mut next| next.all(|(n, _)| !nodes.contains(n)))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    for node in lone {
        if let Some(holder) = aux.graph().neighbors(&node).ok().and_then(|mut next| next.next()) {
            nodes.insert(holder.0.clone());
        }
    }
}

//! Communication cost of a team.

use serde::{Deserialize, Serialize};
use teamform_core::{Team, WeightedGraph};

/// Cost and connectivity of a team in the collaboration graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamEvaluation {
    /// MST weight of the induced subgraph; infinite when disconnected
    pub cost: f64,
    /// Whether the induced subgraph is connected
    pub connected: bool,
}

impl TeamEvaluation {
    /// The cost when it is defined.
    pub fn finite_cost(&self) -> Option<f64> {
        self.cost.is_finite().then_some(self.cost)
    }
}

/// Scores teams by the minimum spanning tree of their induced subgraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamCostEvaluator;

impl TeamCostEvaluator {
    /// Create an evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `team` against `graph`.
    ///
    /// Teams of at most one member cost nothing and count as connected.
    /// Members missing from the graph make the team disconnected.
    pub fn evaluate(&self, graph: &WeightedGraph, team: &Team) -> TeamEvaluation {
        if team.len() <= 1 {
            return TeamEvaluation {
                cost: 0.0,
                connected: true,
            };
        }

        let all_present = team.iter().all(|member| graph.contains_node(member));
        let induced = graph.induced_subgraph(team.iter());
        if !all_present || !induced.is_connected() {
            return TeamEvaluation {
                cost: f64::INFINITY,
                connected: false,
            };
        }

        TeamEvaluation {
            cost: induced.minimum_spanning_tree().total_weight(),
            connected: true,
        }
    }
}

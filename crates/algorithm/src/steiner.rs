//! Steiner tree approximation by nearest-fragment growth.
//!
//! The tree starts at one terminal picked by the caller's random source. Each
//! round scans every (tree node, uncovered terminal) pair, takes the globally
//! cheapest shortest path and grafts it onto the tree. Growth stops when all
//! terminals are attached, when none of the remaining ones is reachable, or
//! when the search budget runs out.
//!
//! Shortest paths are computed once per tree node and cached for the rest of
//! the search, so a run costs roughly one Dijkstra per tree node. This is meant
//! for graphs of hundreds to a few thousand nodes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use teamform_core::{NodeId, ShortestPaths, WeightedGraph};

use crate::budget::SearchBudget;

/// Why tree growth stopped before attaching every terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No remaining terminal has a path to the tree
    Unreachable,
    /// The search budget ran out
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Unreachable => write!(f, "unreachable"),
            StopReason::BudgetExhausted => write!(f, "budget exhausted"),
        }
    }
}

/// Some terminals could not be attached; the tree is partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSteinerFailure<N: Ord> {
    /// Terminals left outside the tree
    pub unreachable: BTreeSet<N>,
    /// Why growth stopped
    pub reason: StopReason,
}

/// Tree grown over a host graph. Edges keep their host weights.
#[derive(Debug, Clone, PartialEq)]
pub struct SteinerTree<N: Ord> {
    nodes: BTreeSet<N>,
    edges: BTreeMap<(N, N), f64>,
}

impl<N: Ord> Default for SteinerTree<N> {
    fn default() -> Self {
        Self {
            nodes: BTreeSet::new(),
            edges: BTreeMap::new(),
        }
    }
}

impl<N: NodeId> SteinerTree<N> {
    fn add_edge(&mut self, u: &N, v: &N, weight: f64) {
        self.nodes.insert(u.clone());
        self.nodes.insert(v.clone());
        let key = if u < v {
            (u.clone(), v.clone())
        } else {
            (v.clone(), u.clone())
        };
        self.edges.insert(key, weight);
    }

    /// Tree nodes in ascending order.
    pub fn nodes(&self) -> &BTreeSet<N> {
        &self.nodes
    }

    /// Tree edges as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, f64)> + '_ {
        self.edges.iter().map(|((u, v), w)| (u, v, *w))
    }

    /// Whether `node` is in the tree.
    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of edge weights.
    pub fn total_weight(&self) -> f64 {
        self.edges.values().sum()
    }

    /// Drop the edges, keeping the node set.
    pub fn into_nodes(self) -> BTreeSet<N> {
        self.nodes
    }
}

/// Result of one Steiner run.
#[derive(Debug, Clone, PartialEq)]
pub struct SteinerOutcome<N: Ord> {
    /// The grown tree (possibly partial)
    pub tree: SteinerTree<N>,
    /// Set when some terminal was left out
    pub failure: Option<PartialSteinerFailure<N>>,
}

impl<N: NodeId> SteinerOutcome<N> {
    fn empty() -> Self {
        Self {
            tree: SteinerTree::default(),
            failure: None,
        }
    }

    /// Whether every terminal was attached.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Nearest-fragment Steiner tree heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteinerApproximator {
    budget: SearchBudget,
}

impl SteinerApproximator {
    /// Create an approximator with an unlimited budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of growth rounds or the wall-clock time.
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Grow a tree connecting `terminals`; returns nodes and edges.
    pub fn tree<N, R>(&self, graph: &WeightedGraph<N>, terminals: &BTreeSet<N>, rng: &mut R) -> SteinerOutcome<N>
    where
        N: NodeId,
        R: Rng + ?Sized,
    {
        if terminals.is_empty() {
            return SteinerOutcome::empty();
        }

        let (present, missing): (Vec<&N>, Vec<&N>) =
            terminals.iter().partition(|t| graph.contains_node(t));
        let mut unattached: BTreeSet<N> = missing.into_iter().cloned().collect();

        if present.is_empty() {
            return SteinerOutcome {
                tree: SteinerTree::default(),
                failure: Some(PartialSteinerFailure {
                    unreachable: unattached,
                    reason: StopReason::Unreachable,
                }),
            };
        }

        let start = present[rng.gen_range(0..present.len())].clone();
        let mut uncovered: BTreeSet<N> = present.into_iter().filter(|t| **t != start).cloned().collect();
        let mut tree = SteinerTree::default();
        tree.nodes.insert(start);

        let mut cache: BTreeMap<N, ShortestPaths<N>> = BTreeMap::new();
        let mut tracker = self.budget.start();
        let mut stop = None;

        while !uncovered.is_empty() {
            if !tracker.tick() {
                stop = Some(StopReason::BudgetExhausted);
                break;
            }

            let mut best: Option<(f64, N, N)> = None;
            for node in tree.nodes.iter() {
                if !cache.contains_key(node) {
                    match graph.single_source(node) {
                        Ok(paths) => {
                            cache.insert(node.clone(), paths);
                        }
                        Err(_) => continue,
                    }
                }
                let paths = &cache[node];
                for terminal in &uncovered {
                    let Some(distance) = paths.distance_to(terminal) else {
                        continue;
                    };
                    if best.as_ref().map_or(true, |(d, _, _)| distance < *d) {
                        best = Some((distance, node.clone(), terminal.clone()));
                    }
                }
            }

            let Some((_, from, to)) = best else {
                stop = Some(StopReason::Unreachable);
                break;
            };
            let Some(path) = cache.get(&from).and_then(|paths| paths.path_to(&to)) else {
                stop = Some(StopReason::Unreachable);
                break;
            };

            // Graft from the last path node already in the tree so the new
            // nodes hang off a single attachment point and no cycle forms.
            let attach = path
                .nodes
                .iter()
                .rposition(|node| tree.contains(node))
                .unwrap_or(0);
            for pair in path.nodes[attach..].windows(2) {
                if let Some(weight) = graph.edge_weight(&pair[0], &pair[1]) {
                    tree.add_edge(&pair[0], &pair[1], weight);
                }
            }
            for node in &path.nodes[attach..] {
                uncovered.remove(node);
            }
        }

        if stop.is_none() && !unattached.is_empty() {
            stop = Some(StopReason::Unreachable);
        }
        unattached.extend(uncovered);
        let failure = stop.map(|reason| PartialSteinerFailure {
            unreachable: unattached,
            reason,
        });

        SteinerOutcome { tree, failure }
    }

    /// Grow a tree connecting `terminals`; returns only its node set.
    pub fn nodes<N, R>(
        &self,
        graph: &WeightedGraph<N>,
        terminals: &BTreeSet<N>,
        rng: &mut R,
    ) -> (BTreeSet<N>, Option<PartialSteinerFailure<N>>)
    where
        N: NodeId,
        R: Rng + ?Sized,
    {
        let outcome = self.tree(graph, terminals, rng);
        (outcome.tree.into_nodes(), outcome.failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn s(id: &str) -> String {
        id.to_string()
    }

    fn graph(edges: &[(&str, &str, f64)]) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        for (u, v, w) in edges {
            g.add_edge(s(u), s(v), *w).unwrap();
        }
        g
    }

    fn terminals(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| s(id)).collect()
    }

    fn random_graph(rng: &mut StdRng, nodes: usize, edge_chance: f64) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        for i in 0..nodes {
            g.add_node(format!("v{i:02}"));
        }
        for i in 0..nodes {
            for j in (i + 1)..nodes {
                if rng.gen_bool(edge_chance) {
                    g.add_edge(format!("v{i:02}"), format!("v{j:02}"), rng.gen_range(0.0..4.0))
                        .unwrap();
                }
            }
        }
        g
    }

    #[test]
    fn test_empty_terminals_give_empty_tree() {
        let g = graph(&[("a", "b", 1.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = SteinerApproximator::new().tree(&g, &BTreeSet::new(), &mut rng);
        assert!(outcome.tree.is_empty());
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_single_terminal() {
        let g = graph(&[("a", "b", 1.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        let (nodes, failure) = SteinerApproximator::new().nodes(&g, &terminals(&["b"]), &mut rng);
        assert_eq!(nodes, terminals(&["b"]));
        assert!(failure.is_none());
    }

    #[test]
    fn test_star_uses_center() {
        // Terminals at the tips of a star; the center is the only bridge.
        let g = graph(&[("c", "x", 1.0), ("c", "y", 1.0), ("c", "z", 1.0), ("x", "y", 5.0)]);
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = SteinerApproximator::new().tree(&g, &terminals(&["x", "y", "z"]), &mut rng);
            assert!(outcome.is_complete());
            assert_eq!(outcome.tree.nodes(), &terminals(&["c", "x", "y", "z"]));
            assert_eq!(outcome.tree.edges().count(), 3);
            assert!((outcome.tree.total_weight() - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unreachable_terminals_reported() {
        let mut g = graph(&[("a", "b", 1.0), ("c", "d", 1.0)]);
        g.add_node(s("lonely"));
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = SteinerApproximator::new().tree(&g, &terminals(&["a", "b", "ghost"]), &mut rng);
        assert_eq!(outcome.tree.nodes(), &terminals(&["a", "b"]));
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.unreachable, terminals(&["ghost"]));
        assert_eq!(failure.reason, StopReason::Unreachable);

        let mut rng = StdRng::seed_from_u64(3);
        let outcome = SteinerApproximator::new().tree(&g, &terminals(&["a", "c"]), &mut rng);
        assert_eq!(outcome.tree.len(), 1);
        assert_eq!(outcome.failure.unwrap().unreachable.len(), 1);
    }

    #[test]
    fn test_budget_stops_growth() {
        let g = graph(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "d", 1.0)]);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = SteinerApproximator::new()
            .with_budget(SearchBudget::new().with_max_iterations(0))
            .tree(&g, &terminals(&["a", "d"]), &mut rng);
        assert_eq!(outcome.tree.len(), 1);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.reason, StopReason::BudgetExhausted);
        assert_eq!(failure.unreachable.len(), 1);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let mut rng = StdRng::seed_from_u64(99);
        let g = random_graph(&mut rng, 20, 0.25);
        let picked = terminals(&["v01", "v05", "v09", "v13", "v17"]);
        let first = SteinerApproximator::new().tree(&g, &picked, &mut StdRng::seed_from_u64(5));
        let second = SteinerApproximator::new().tree(&g, &picked, &mut StdRng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_graphs_tree_properties() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..40 {
            let g = random_graph(&mut rng, 16, 0.18);
            let picked: BTreeSet<String> = (0..16)
                .filter(|_| rng.gen_bool(0.3))
                .map(|i| format!("v{i:02}"))
                .collect();

            let outcome = SteinerApproximator::new().tree(&g, &picked, &mut rng);
            if picked.is_empty() {
                assert!(outcome.tree.is_empty());
                continue;
            }

            // Edges come from the host graph with their weights.
            for (u, v, w) in outcome.tree.edges() {
                assert_eq!(g.edge_weight(u, v), Some(w));
            }

            // The tree is connected and acyclic.
            let mut as_graph = WeightedGraph::new();
            for node in outcome.tree.nodes() {
                as_graph.add_node(node.clone());
            }
            for (u, v, w) in outcome.tree.edges() {
                as_graph.add_edge(u.clone(), v.clone(), w).unwrap();
            }
            assert!(as_graph.is_connected());
            assert_eq!(as_graph.edge_count(), as_graph.node_count() - 1);

            // Every terminal reachable from the start terminal is attached.
            let start_component = g
                .connected_components()
                .into_iter()
                .find(|component| outcome.tree.nodes().iter().any(|n| component.contains(n)))
                .unwrap();
            for terminal in &picked {
                if start_component.contains(terminal) {
                    assert!(outcome.tree.contains(terminal));
                } else {
                    assert!(outcome.failure.as_ref().unwrap().unreachable.contains(terminal));
                }
            }
            assert_eq!(
                outcome.is_complete(),
                picked.iter().all(|t| start_component.contains(t))
            );
        }
    }
}

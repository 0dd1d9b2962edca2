//! Weighted undirected graph.
//!
//! Nodes are kept in ordered maps, so every iteration (nodes, neighbours,
//! edges, components) is deterministic.
//!
//! # Shortest-path tie-break
//!
//! [`WeightedGraph::shortest_path`] runs Dijkstra with a binary heap keyed by
//! `(distance, node)`. Equal distances pop in ascending node order, and a
//! tentative predecessor is only replaced on a strict improvement. Among
//! several equal-cost paths the one discovered first under that order wins,
//! so repeated queries on the same graph always return the same node sequence.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Anything usable as a graph node identifier.
pub trait NodeId: Ord + Clone + fmt::Display {}

impl<T: Ord + Clone + fmt::Display> NodeId for T {}

/// Undirected graph with nonnegative edge weights.
///
/// The graph may be disconnected. Adding an edge that already exists
/// overwrites its weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph<N: Ord = String> {
    adjacency: BTreeMap<N, BTreeMap<N, f64>>,
    edge_count: usize,
}

impl<N: Ord> Default for WeightedGraph<N> {
    fn default() -> Self {
        Self {
            adjacency: BTreeMap::new(),
            edge_count: 0,
        }
    }
}

/// A node sequence together with its cumulative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path<N> {
    /// Nodes from source to target, both included
    pub nodes: Vec<N>,
    /// Sum of the edge weights along the path
    pub cost: f64,
}

impl<N> Path<N> {
    /// Consecutive node pairs along the path.
    pub fn hops(&self) -> impl Iterator<Item = (&N, &N)> + '_ {
        self.nodes.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// Single-source shortest-path distances and predecessors.
#[derive(Debug, Clone)]
pub struct ShortestPaths<N: Ord> {
    source: N,
    distances: BTreeMap<N, f64>,
    predecessors: BTreeMap<N, N>,
}

impl<N: NodeId> ShortestPaths<N> {
    /// The node the search started from.
    pub fn source(&self) -> &N {
        &self.source
    }

    /// Distance to `node`, or `None` when unreachable.
    pub fn distance_to(&self, node: &N) -> Option<f64> {
        self.distances.get(node).copied()
    }

    /// Every reachable node with its distance, in node order.
    pub fn reachable(&self) -> impl Iterator<Item = (&N, f64)> + '_ {
        self.distances.iter().map(|(node, dist)| (node, *dist))
    }

    /// Rebuild the path to `node`, or `None` when unreachable.
    pub fn path_to(&self, node: &N) -> Option<Path<N>> {
        let cost = self.distance_to(node)?;
        let mut nodes = vec![node.clone()];
        let mut current = node;
        while let Some(previous) = self.predecessors.get(current) {
            nodes.push(previous.clone());
            current = previous;
        }
        nodes.reverse();
        Some(Path { nodes, cost })
    }
}

/// Heap key: total order over distances.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Distance(f64);

impl Eq for Distance {}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Union-find with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) -> bool {
        let px = self.find(x);
        let py = self.find(y);
        if px == py {
            return false;
        }
        match self.rank[px].cmp(&self.rank[py]) {
            Ordering::Less => self.parent[px] = py,
            Ordering::Greater => self.parent[py] = px,
            Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
        true
    }
}

impl<N: NodeId> WeightedGraph<N> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an isolated node. No-op when the node already exists.
    pub fn add_node(&mut self, node: N) {
        self.adjacency.entry(node).or_default();
    }

    /// Add (or re-weight) the undirected edge `u - v`.
    ///
    /// Rejects self loops and weights that are negative, NaN or infinite.
    pub fn add_edge(&mut self, u: N, v: N, weight: f64) -> Result<()> {
        if u == v {
            return Err(GraphError::SelfLoop(u.to_string()));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight {
                u: u.to_string(),
                v: v.to_string(),
                weight,
            });
        }
        self.insert_edge(u, v, weight);
        Ok(())
    }

    fn insert_edge(&mut self, u: N, v: N, weight: f64) {
        let previous = self
            .adjacency
            .entry(u.clone())
            .or_default()
            .insert(v.clone(), weight);
        self.adjacency.entry(v).or_default().insert(u, weight);
        if previous.is_none() {
            self.edge_count += 1;
        }
    }

    /// Whether `node` is part of the graph.
    pub fn contains_node(&self, node: &N) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.adjacency.keys()
    }

    /// Every edge once, as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, f64)> + '_ {
        self.adjacency.iter().flat_map(|(u, neighbors)| {
            neighbors
                .iter()
                .filter(move |(v, _)| u < *v)
                .map(move |(v, weight)| (u, v, *weight))
        })
    }

    /// Neighbours of `node` with the connecting edge weight.
    pub fn neighbors(&self, node: &N) -> Result<impl Iterator<Item = (&N, f64)> + '_> {
        let neighbors = self
            .adjacency
            .get(node)
            .ok_or_else(|| GraphError::UnknownNode(node.to_string()))?;
        Ok(neighbors.iter().map(|(v, weight)| (v, *weight)))
    }

    /// Number of incident edges; zero for unknown nodes.
    pub fn degree(&self, node: &N) -> usize {
        self.adjacency.get(node).map_or(0, BTreeMap::len)
    }

    /// Weight of the edge `u - v`, if present.
    pub fn edge_weight(&self, u: &N, v: &N) -> Option<f64> {
        self.adjacency.get(u)?.get(v).copied()
    }

    /// Sum of all edge weights.
    ///
    /// Bounds the cost of every simple path in the graph.
    pub fn total_weight(&self) -> f64 {
        self.edges().map(|(_, _, weight)| weight).sum()
    }

    /// Shortest paths from `source` to every reachable node.
    pub fn single_source(&self, source: &N) -> Result<ShortestPaths<N>> {
        self.dijkstra(source, None)
    }

    /// Minimum-weight path from `source` to `target`.
    ///
    /// Fails with [`GraphError::NoPath`] when the nodes are disconnected.
    pub fn shortest_path(&self, source: &N, target: &N) -> Result<Path<N>> {
        if !self.contains_node(target) {
            return Err(GraphError::UnknownNode(target.to_string()));
        }
        self.dijkstra(source, Some(target))?
            .path_to(target)
            .ok_or_else(|| GraphError::NoPath {
                from: source.to_string(),
                to: target.to_string(),
            })
    }

    /// Cost of the minimum-weight path from `source` to `target`.
    pub fn shortest_path_length(&self, source: &N, target: &N) -> Result<f64> {
        self.shortest_path(source, target).map(|path| path.cost)
    }

    fn dijkstra(&self, source: &N, target: Option<&N>) -> Result<ShortestPaths<N>> {
        if !self.contains_node(source) {
            return Err(GraphError::UnknownNode(source.to_string()));
        }

        let mut distances = BTreeMap::new();
        let mut predecessors = BTreeMap::new();
        let mut settled = BTreeSet::new();
        let mut heap = BinaryHeap::new();

        distances.insert(source.clone(), 0.0);
        heap.push(Reverse((Distance(0.0), source.clone())));

        while let Some(Reverse((Distance(dist), node))) = heap.pop() {
            if !settled.insert(node.clone()) {
                continue;
            }
            if target == Some(&node) {
                break;
            }
            for (next, weight) in &self.adjacency[&node] {
                if settled.contains(next) {
                    continue;
                }
                let candidate = dist + weight;
                let improved = distances
                    .get(next)
                    .map_or(true, |current: &f64| candidate < *current);
                if improved {
                    distances.insert(next.clone(), candidate);
                    predecessors.insert(next.clone(), node.clone());
                    heap.push(Reverse((Distance(candidate), next.clone())));
                }
            }
        }

        Ok(ShortestPaths {
            source: source.clone(),
            distances,
            predecessors,
        })
    }

    /// Subgraph induced by `nodes`. Nodes absent from the graph are ignored.
    pub fn induced_subgraph<'a, I>(&self, nodes: I) -> WeightedGraph<N>
    where
        I: IntoIterator<Item = &'a N>,
        N: 'a,
    {
        let keep: BTreeSet<&N> = nodes
            .into_iter()
            .filter(|node| self.contains_node(node))
            .collect();

        let mut subgraph = WeightedGraph::new();
        for &node in &keep {
            subgraph.add_node(node.clone());
            for (next, weight) in &self.adjacency[node] {
                if node < next && keep.contains(&next) {
                    subgraph.insert_edge(node.clone(), next.clone(), *weight);
                }
            }
        }
        subgraph
    }

    /// Minimum spanning forest (Kruskal): one tree per connected component.
    ///
    /// Equal weights are ordered by endpoint ids, so the result is stable.
    pub fn minimum_spanning_tree(&self) -> WeightedGraph<N> {
        let index: BTreeMap<&N, usize> = self
            .adjacency
            .keys()
            .enumerate()
            .map(|(i, node)| (node, i))
            .collect();

        let mut edges: Vec<(&N, &N, f64)> = self.edges().collect();
        edges.sort_by(|a, b| {
            a.2.total_cmp(&b.2)
                .then_with(|| a.0.cmp(b.0))
                .then_with(|| a.1.cmp(b.1))
        });

        let mut forest = UnionFind::new(index.len());
        let mut tree = WeightedGraph::new();
        for node in self.adjacency.keys() {
            tree.add_node(node.clone());
        }
        for (u, v, weight) in edges {
            if forest.union(index[u], index[v]) {
                tree.insert_edge(u.clone(), v.clone(), weight);
            }
        }
        tree
    }

    /// Connected components in order of their smallest node.
    pub fn connected_components(&self) -> Vec<BTreeSet<N>> {
        let mut seen: BTreeSet<&N> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.adjacency.keys() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                component.insert(node.clone());
                for next in self.adjacency[node].keys() {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Whether every node reaches every other node.
    ///
    /// A graph without nodes is reported as not connected.
    pub fn is_connected(&self) -> bool {
        !self.is_empty() && self.connected_components().len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn graph(edges: &[(&str, &str, f64)]) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        for (u, v, w) in edges {
            g.add_edge(u.to_string(), v.to_string(), *w).unwrap();
        }
        g
    }

    fn s(id: &str) -> String {
        id.to_string()
    }

    fn random_graph(rng: &mut StdRng, nodes: usize, edge_chance: f64) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        for i in 0..nodes {
            g.add_node(format!("n{i:02}"));
        }
        for i in 0..nodes {
            for j in (i + 1)..nodes {
                if rng.gen_bool(edge_chance) {
                    let w = rng.gen_range(0.0..10.0);
                    g.add_edge(format!("n{i:02}"), format!("n{j:02}"), w).unwrap();
                }
            }
        }
        g
    }

    #[test]
    fn test_add_edge_rejects_invalid_weights() {
        let mut g = WeightedGraph::new();
        assert!(matches!(
            g.add_edge(s("a"), s("b"), -1.0),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert!(matches!(
            g.add_edge(s("a"), s("b"), f64::NAN),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert!(matches!(
            g.add_edge(s("a"), s("b"), f64::INFINITY),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert!(matches!(
            g.add_edge(s("a"), s("a"), 1.0),
            Err(GraphError::SelfLoop(_))
        ));
        assert!(g.is_empty());
    }

    #[test]
    fn test_add_edge_overwrites_weight() {
        let mut g = graph(&[("a", "b", 3.0)]);
        g.add_edge(s("b"), s("a"), 1.5).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_weight(&s("a"), &s("b")), Some(1.5));
        assert_eq!(g.edge_weight(&s("b"), &s("a")), Some(1.5));
    }

    #[test]
    fn test_shortest_path_prefers_lighter_detour() {
        let g = graph(&[("a", "b", 5.0), ("a", "c", 1.0), ("c", "b", 1.0)]);
        let path = g.shortest_path(&s("a"), &s("b")).unwrap();
        assert_eq!(path.nodes, vec![s("a"), s("c"), s("b")]);
        assert_eq!(path.cost, 2.0);
        assert_eq!(path.hops().count(), 2);
    }

    #[test]
    fn test_shortest_path_tie_break_is_stable() {
        // Two equal-cost routes a-b-d and a-c-d.
        let g = graph(&[("a", "b", 1.0), ("a", "c", 1.0), ("b", "d", 1.0), ("c", "d", 1.0)]);
        let first = g.shortest_path(&s("a"), &s("d")).unwrap();
        assert_eq!(first.nodes, vec![s("a"), s("b"), s("d")]);
        for _ in 0..10 {
            assert_eq!(g.shortest_path(&s("a"), &s("d")).unwrap(), first);
        }
    }

    #[test]
    fn test_shortest_path_errors() {
        let mut g = graph(&[("a", "b", 1.0)]);
        g.add_node(s("z"));

        let err = g.shortest_path(&s("a"), &s("z")).unwrap_err();
        assert!(err.is_no_path());

        let err = g.shortest_path(&s("a"), &s("missing")).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(s("missing")));

        let err = g.shortest_path(&s("missing"), &s("a")).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(s("missing")));
    }

    #[test]
    fn test_shortest_path_to_self() {
        let g = graph(&[("a", "b", 1.0)]);
        let path = g.shortest_path(&s("a"), &s("a")).unwrap();
        assert_eq!(path.nodes, vec![s("a")]);
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn test_single_source_distances() {
        let g = graph(&[("a", "b", 1.0), ("b", "c", 2.0), ("x", "y", 1.0)]);
        let paths = g.single_source(&s("a")).unwrap();
        assert_eq!(paths.source(), &s("a"));
        assert_eq!(paths.distance_to(&s("c")), Some(3.0));
        assert_eq!(paths.distance_to(&s("x")), None);
        assert_eq!(paths.reachable().count(), 3);
        assert_eq!(
            paths.path_to(&s("c")).unwrap().nodes,
            vec![s("a"), s("b"), s("c")]
        );
    }

    #[test]
    fn test_induced_subgraph_keeps_internal_edges() {
        let g = graph(&[("a", "b", 1.0), ("b", "c", 1.0), ("a", "c", 4.0), ("c", "d", 1.0)]);
        let nodes = [s("a"), s("c"), s("d"), s("ghost")];
        let sub = g.induced_subgraph(nodes.iter());
        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(sub.edge_weight(&s("a"), &s("c")), Some(4.0));
        assert!(!sub.contains_node(&s("b")));
    }

    #[test]
    fn test_minimum_spanning_tree_weight() {
        let g = graph(&[
            ("a", "b", 1.0),
            ("b", "c", 2.0),
            ("a", "c", 2.5),
            ("c", "d", 0.5),
            ("b", "d", 3.0),
        ]);
        let mst = g.minimum_spanning_tree();
        assert_eq!(mst.edge_count(), 3);
        assert!((mst.total_weight() - 3.5).abs() < 1e-12);
        assert!(mst.is_connected());
    }

    #[test]
    fn test_minimum_spanning_forest_per_component() {
        let g = graph(&[("a", "b", 1.0), ("x", "y", 2.0), ("y", "z", 2.0), ("x", "z", 9.0)]);
        let mst = g.minimum_spanning_tree();
        assert_eq!(mst.node_count(), 5);
        assert_eq!(mst.edge_count(), 3);
        assert!((mst.total_weight() - 5.0).abs() < 1e-12);
        assert!(!mst.is_connected());
    }

    #[test]
    fn test_connectivity() {
        let mut g = graph(&[("a", "b", 1.0)]);
        assert!(g.is_connected());
        g.add_node(s("c"));
        assert!(!g.is_connected());
        assert_eq!(g.connected_components().len(), 2);
        assert!(!WeightedGraph::<String>::new().is_connected());
    }

    #[test]
    fn test_neighbors_and_degree() {
        let g = graph(&[("a", "b", 1.0), ("a", "c", 2.0)]);
        let neighbors: Vec<_> = g.neighbors(&s("a")).unwrap().collect();
        assert_eq!(neighbors, vec![(&s("b"), 1.0), (&s("c"), 2.0)]);
        assert_eq!(g.degree(&s("a")), 2);
        assert_eq!(g.degree(&s("ghost")), 0);
        assert!(g.neighbors(&s("ghost")).is_err());
    }

    #[test]
    fn test_random_graphs_forest_and_paths_agree() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..25 {
            let g = random_graph(&mut rng, 14, 0.2);
            let components = g.connected_components();
            let mst = g.minimum_spanning_tree();

            // A spanning forest has n - c edges and never outweighs the graph.
            assert_eq!(mst.edge_count(), g.node_count() - components.len());
            assert!(mst.total_weight() <= g.total_weight() + 1e-9);
            for (u, v, w) in mst.edges() {
                assert_eq!(g.edge_weight(u, v), Some(w));
            }

            // Paths exist exactly within components and are made of real edges.
            for component in &components {
                let first = component.iter().next().unwrap();
                for other in component {
                    let path = g.shortest_path(first, other).unwrap();
                    let summed: f64 = path
                        .hops()
                        .map(|(a, b)| g.edge_weight(a, b).unwrap())
                        .sum();
                    assert!((summed - path.cost).abs() < 1e-9);
                }
            }
            if components.len() > 1 {
                let a = components[0].iter().next().unwrap();
                let b = components[1].iter().next().unwrap();
                assert!(g.shortest_path(a, b).unwrap_err().is_no_path());
            }
        }
    }
}

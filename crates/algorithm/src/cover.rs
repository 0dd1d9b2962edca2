//! Greedy skill-coverage selection.
//!
//! Two strategies share one contract: repeatedly add the entity with the best
//! score until every required skill is covered or nobody adds a new skill.
//! Candidates are scanned in skill-map order and a candidate only replaces the
//! current best on a strictly better score, so ties go to the entity that was
//! ingested first.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use teamform_core::{Entity, ShortestPaths, Skill, SkillMap, SkillRequirement, Team, WeightedGraph};

/// Coverage could not be completed; the team is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageIncomplete {
    /// Required skills no selected entity offers
    pub missing: BTreeSet<Skill>,
}

/// Result of a cover selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverOutcome {
    /// Selected entities (seed members included)
    pub team: Team,
    /// Entities added by the selector, in pick order
    pub picks: Vec<String>,
    /// Required skills the team covers
    pub covered: BTreeSet<Skill>,
    /// Set when some required skill stayed uncovered
    pub incomplete: Option<CoverageIncomplete>,
}

impl CoverOutcome {
    fn finish(team: Team, picks: Vec<String>, covered: BTreeSet<Skill>, requirement: &SkillRequirement) -> Self {
        let missing: BTreeSet<Skill> = requirement.skills().difference(&covered).cloned().collect();
        let incomplete = (!missing.is_empty()).then_some(CoverageIncomplete { missing });
        Self {
            team,
            picks,
            covered,
            incomplete,
        }
    }

    /// Whether every required skill is covered.
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_none()
    }
}

/// Strategy for choosing entities that cover a skill requirement.
pub trait CoverSelector {
    /// Select a team for `requirement`.
    fn select(&self, skills: &SkillMap, requirement: &SkillRequirement) -> CoverOutcome;
}

/// Required skills `entity` would add on top of `covered`.
fn new_skills<'a>(
    entity: &'a Entity,
    requirement: &SkillRequirement,
    covered: &BTreeSet<Skill>,
) -> Vec<&'a Skill> {
    entity
        .skills
        .iter()
        .filter(|skill| requirement.contains(skill) && !covered.contains(*skill))
        .collect()
}

/// Plain greedy set cover: maximise the number of newly covered skills.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyCover;

impl GreedyCover {
    /// Create the selector.
    pub fn new() -> Self {
        Self
    }
}

impl CoverSelector for GreedyCover {
    fn select(&self, skills: &SkillMap, requirement: &SkillRequirement) -> CoverOutcome {
        let mut team = Team::new();
        let mut picks = Vec::new();
        let mut covered = BTreeSet::new();

        while covered.len() < requirement.len() {
            let mut best: Option<(&Entity, Vec<&Skill>)> = None;

            for entity in skills.iter() {
                if team.contains(&entity.id) {
                    continue;
                }
                let gained = new_skills(entity, requirement, &covered);
                let best_gain = best.as_ref().map_or(0, |(_, skills)| skills.len());
                if gained.len() > best_gain {
                    best = Some((entity, gained));
                }
            }

            let Some((entity, gained)) = best else {
                break;
            };
            team.insert(entity.id.clone());
            picks.push(entity.id.clone());
            covered.extend(gained.into_iter().cloned());
        }

        CoverOutcome::finish(team, picks, covered, requirement)
    }
}

/// Graph-aware greedy cover.
///
/// Scores a candidate as `new_skills / (1 + distance to center)`. The center
/// starts as the seed member with the smallest total distance to the other
/// seed members and then moves to the entity picked last; it is not a running
/// centroid. Candidates unreachable from the center score zero but remain
/// selectable when nobody else offers their skills.
#[derive(Debug, Clone)]
pub struct GraphAwareCover<'g> {
    graph: &'g WeightedGraph,
    seed: Team,
}

impl<'g> GraphAwareCover<'g> {
    /// Create the selector with an empty seed team.
    pub fn new(graph: &'g WeightedGraph) -> Self {
        Self {
            graph,
            seed: Team::new(),
        }
    }

    /// Start from an existing team. Skills the seed already offers count as covered.
    pub fn with_seed(mut self, seed: Team) -> Self {
        self.seed = seed;
        self
    }

    /// Seed member minimising the summed distance to the other members.
    ///
    /// Members outside the graph, or separated from another member, sum to
    /// infinity; ties keep the smallest id.
    fn initial_center(&self) -> Option<String> {
        let mut best: Option<(&String, f64)> = None;
        for member in self.seed.iter() {
            let total = match self.graph.single_source(member) {
                Ok(paths) => self
                    .seed
                    .iter()
                    .map(|other| paths.distance_to(other).unwrap_or(f64::INFINITY))
                    .sum(),
                Err(_) => f64::INFINITY,
            };
            if best.map_or(true, |(_, best_total)| total < best_total) {
                best = Some((member, total));
            }
        }
        best.map(|(member, _)| member.clone())
    }

    fn distance_from(center: Option<&ShortestPaths<String>>, has_center: bool, id: &String) -> f64 {
        match (has_center, center) {
            (false, _) => 0.0,
            (true, Some(paths)) => paths.distance_to(id).unwrap_or(f64::INFINITY),
            (true, None) => f64::INFINITY,
        }
    }
}

impl CoverSelector for GraphAwareCover<'_> {
    fn select(&self, skills: &SkillMap, requirement: &SkillRequirement) -> CoverOutcome {
        let mut team = self.seed.clone();
        let mut picks = Vec::new();
        let mut covered = team.covered_skills(skills, requirement);
        let mut center = self.initial_center();

        while covered.len() < requirement.len() {
            // A center outside the graph leaves every candidate at infinity.
            let paths = center
                .as_ref()
                .and_then(|c| self.graph.single_source(c).ok());

            let mut best: Option<(&Entity, Vec<&Skill>)> = None;
            let mut best_score = f64::NEG_INFINITY;

            for entity in skills.iter() {
                if team.contains(&entity.id) {
                    continue;
                }
                let gained = new_skills(entity, requirement, &covered);
                if gained.is_empty() {
                    continue;
                }
                let distance = Self::distance_from(paths.as_ref(), center.is_some(), &entity.id);
                let score = gained.len() as f64 / (1.0 + distance);
                if score > best_score {
                    best_score = score;
                    best = Some((entity, gained));
                }
            }

            let Some((entity, gained)) = best else {
                break;
            };
            team.insert(entity.id.clone());
            picks.push(entity.id.clone());
            covered.extend(gained.into_iter().cloned());
            center = Some(entity.id.clone());
        }

        CoverOutcome::finish(team, picks, covered, requirement)
    }
}

/// Cover strategies available to the pipelines.
#[derive(Debug, Clone)]
pub enum CoverStrategy<'g> {
    /// Plain greedy set cover
    Plain(GreedyCover),
    /// Distance-weighted greedy cover
    GraphAware(GraphAwareCover<'g>),
}

impl CoverSelector for CoverStrategy<'_> {
    fn select(&self, skills: &SkillMap, requirement: &SkillRequirement) -> CoverOutcome {
        match self {
            Self::Plain(s) => s.select(skills, requirement),
            Self::GraphAware(s) => s.select(skills, requirement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn skills(entries: &[(&str, &[&str])]) -> SkillMap {
        SkillMap::from_entities(
            entries
                .iter()
                .map(|(id, skills)| Entity::new(*id, skills.iter().copied())),
        )
        .unwrap()
    }

    fn requirement(skills: &[&str]) -> SkillRequirement {
        SkillRequirement::new(skills.iter().copied()).unwrap()
    }

    fn graph(edges: &[(&str, &str, f64)]) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        for (u, v, w) in edges {
            g.add_edge(u.to_string(), v.to_string(), *w).unwrap();
        }
        g
    }

    #[test]
    fn test_plain_prefers_largest_gain() {
        let map = skills(&[("a", &["x"]), ("b", &["x", "y", "z"]), ("c", &["w"])]);
        let outcome = GreedyCover::new().select(&map, &requirement(&["x", "y", "z", "w"]));
        assert_eq!(outcome.picks, vec!["b", "c"]);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_plain_ties_follow_skill_map_order() {
        let map = skills(&[("c", &["x"]), ("a", &["x"]), ("b", &["x"])]);
        let outcome = GreedyCover::new().select(&map, &requirement(&["x"]));
        assert_eq!(outcome.picks, vec!["c"]);
    }

    #[test]
    fn test_plain_reports_missing_skills() {
        let map = skills(&[("a", &["x"]), ("b", &["y"])]);
        let outcome = GreedyCover::new().select(&map, &requirement(&["x", "ghost"]));
        assert_eq!(outcome.team.len(), 1);
        assert!(outcome.team.contains("a"));
        let missing = outcome.incomplete.unwrap().missing;
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["ghost"]);
    }

    #[test]
    fn test_graph_aware_first_pick_is_plain_greedy() {
        let g = graph(&[("a", "b", 1.0), ("b", "c", 1.0)]);
        let map = skills(&[("a", &["x"]), ("c", &["x", "y"])]);
        let outcome = GraphAwareCover::new(&g).select(&map, &requirement(&["x", "y"]));
        assert_eq!(outcome.picks, vec!["c"]);
    }

    #[test]
    fn test_graph_aware_prefers_close_candidates() {
        // near and far both offer y; near sits next to the first pick.
        let g = graph(&[("a", "near", 1.0), ("a", "hub", 5.0), ("hub", "far", 5.0)]);
        let map = skills(&[("a", &["x"]), ("far", &["y"]), ("near", &["y"])]);
        let outcome = GraphAwareCover::new(&g).select(&map, &requirement(&["x", "y"]));
        assert_eq!(outcome.picks, vec!["a", "near"]);

        let plain = GreedyCover::new().select(&map, &requirement(&["x", "y"]));
        assert_eq!(plain.picks, vec!["a", "far"]);
    }

    #[test]
    fn test_graph_aware_unreachable_candidate_still_selectable() {
        let mut g = graph(&[("a", "b", 1.0)]);
        g.add_node("island".to_string());
        let map = skills(&[("a", &["x"]), ("island", &["y"])]);
        let outcome = GraphAwareCover::new(&g).select(&map, &requirement(&["x", "y"]));
        assert!(outcome.is_complete());
        assert!(outcome.team.contains("island"));
    }

    #[test]
    fn test_graph_aware_seed_sets_center_and_coverage() {
        let g = graph(&[
            ("s1", "s2", 1.0),
            ("s2", "s3", 1.0),
            ("s2", "near", 1.0),
            ("s1", "far", 1.5),
            ("far", "x", 10.0),
        ]);
        let map = skills(&[
            ("s1", &["p"]),
            ("s2", &["q"]),
            ("s3", &["r"]),
            ("far", &["y"]),
            ("near", &["y"]),
        ]);
        let seed: Team = ["s1", "s2", "s3"].into_iter().collect();
        let selector = GraphAwareCover::new(&g).with_seed(seed);
        assert_eq!(selector.initial_center().as_deref(), Some("s2"));

        let outcome = selector.select(&map, &requirement(&["p", "y"]));
        // p comes from the seed; y from the entity closest to s2.
        assert_eq!(outcome.picks, vec!["near"]);
        assert_eq!(outcome.team.len(), 4);
    }

    #[test]
    fn test_strategy_dispatch() {
        let g = graph(&[("a", "b", 1.0)]);
        let map = skills(&[("a", &["x"]), ("b", &["y"])]);
        let req = requirement(&["x", "y"]);
        for strategy in [
            CoverStrategy::Plain(GreedyCover::new()),
            CoverStrategy::GraphAware(GraphAwareCover::new(&g)),
        ] {
            let outcome = strategy.select(&map, &req);
            assert_eq!(outcome.team.len(), 2);
        }
    }

    #[test]
    fn test_never_repeats_and_bounded_by_relevant_entities() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool = ["a", "b", "c", "d", "e", "f"];
        for round in 0..50 {
            let entries: Vec<Entity> = (0..12)
                .map(|i| {
                    let count = rng.gen_range(0..3);
                    let owned: Vec<&str> = (0..count).map(|_| pool[rng.gen_range(0..pool.len())]).collect();
                    Entity::new(format!("e{i:02}"), owned)
                })
                .collect();
            let map = SkillMap::from_entities(entries).unwrap();

            let mut g = WeightedGraph::new();
            for i in 0..12 {
                g.add_node(format!("e{i:02}"));
            }
            for _ in 0..15 {
                let u = rng.gen_range(0..12);
                let v = rng.gen_range(0..12);
                if u != v {
                    g.add_edge(format!("e{u:02}"), format!("e{v:02}"), rng.gen_range(0.1..5.0))
                        .unwrap();
                }
            }

            let req = requirement(&pool[..(round % 5) + 1]);
            let relevant = map
                .iter()
                .filter(|e| e.skills.iter().any(|s| req.contains(s)))
                .count();

            for outcome in [
                GreedyCover::new().select(&map, &req),
                GraphAwareCover::new(&g).select(&map, &req),
            ] {
                let unique: BTreeSet<_> = outcome.picks.iter().collect();
                assert_eq!(unique.len(), outcome.picks.len());
                assert!(outcome.team.len() <= relevant);
                assert_eq!(outcome.covered, outcome.team.covered_skills(&map, &req));
            }
        }
    }
}

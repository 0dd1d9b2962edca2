//! Random task generation from category skill pools.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use teamform_core::Skill;
use teamform_storage::{Dataset, TaskSpec};
use tracing::{debug, info};

use crate::error::{EvaluationError, Result};

/// Shape of a generated task suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Task sizes (number of required skills)
    pub t_values: Vec<usize>,
    /// Number of categories each task draws from
    pub s_values: Vec<usize>,
    /// Tasks wanted per (t, s) bucket
    pub tasks_per_bucket: usize,
    /// Draw attempts per bucket before giving up
    pub max_trials: usize,
    /// Generator seed
    pub seed: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            t_values: (2..=20).step_by(2).collect(),
            s_values: vec![1],
            tasks_per_bucket: 100,
            max_trials: 300,
            seed: 42,
        }
    }
}

impl SuiteConfig {
    /// Reject configurations that cannot produce tasks.
    pub fn validate(&self) -> Result<()> {
        if self.t_values.contains(&0) {
            return Err(EvaluationError::InvalidConfig("t values must be positive".into()));
        }
        if self.s_values.contains(&0) {
            return Err(EvaluationError::InvalidConfig("s values must be positive".into()));
        }
        Ok(())
    }
}

/// Draws skill requirements from the skills of randomly chosen categories.
pub struct TaskGenerator {
    categories: Vec<String>,
    category_skills: BTreeMap<String, BTreeSet<Skill>>,
    valid_skills: BTreeSet<Skill>,
    rng: StdRng,
}

impl TaskGenerator {
    /// Build the category pools of `dataset`; only skills of in-graph
    /// entities are eligible.
    pub fn new(dataset: &Dataset, seed: u64) -> Self {
        let category_skills = dataset.category_skills();
        let valid_skills = dataset.graph_skills();
        debug!(
            "Generator pools: {} categories, {} valid skills",
            category_skills.len(),
            valid_skills.len()
        );
        Self {
            categories: category_skills.keys().cloned().collect(),
            category_skills,
            valid_skills,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Skills per category.
    pub fn category_sizes(&self) -> BTreeMap<&str, usize> {
        self.category_skills
            .iter()
            .map(|(category, skills)| (category.as_str(), skills.len()))
            .collect()
    }

    /// Draw one task with `t` skills from `s` categories.
    ///
    /// Returns `None` when there are fewer than `s` categories or the chosen
    /// categories offer fewer than `t` eligible skills.
    pub fn generate(&mut self, t: usize, s: usize) -> Option<TaskSpec> {
        if self.categories.len() < s {
            return None;
        }
        let chosen: BTreeSet<String> = self
            .categories
            .choose_multiple(&mut self.rng, s)
            .cloned()
            .collect();

        let candidates: Vec<&Skill> = chosen
            .iter()
            .filter_map(|category| self.category_skills.get(category))
            .flatten()
            .filter(|skill| self.valid_skills.contains(*skill))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if candidates.len() < t {
            return None;
        }

        let skills: BTreeSet<Skill> = candidates
            .choose_multiple(&mut self.rng, t)
            .map(|skill| (*skill).clone())
            .collect();
        Some(TaskSpec {
            t,
            s,
            skills,
            categories: chosen,
        })
    }

    /// Generate a full suite: for every (t, s) bucket, draw until
    /// `tasks_per_bucket` tasks exist or `max_trials` attempts are spent.
    pub fn generate_suite(&mut self, config: &SuiteConfig) -> Result<Vec<TaskSpec>> {
        config.validate()?;
        let mut tasks = Vec::new();
        for &t in &config.t_values {
            for &s in &config.s_values {
                let mut generated = 0;
                let mut trials = 0;
                while generated < config.tasks_per_bucket && trials < config.max_trials {
                    if let Some(task) = self.generate(t, s) {
                        tasks.push(task);
                        generated += 1;
                    }
                    trials += 1;
                }
                info!("Generated {} tasks for t={}, s={}", generated, t, s);
            }
        }
        Ok(tasks)
    }
}

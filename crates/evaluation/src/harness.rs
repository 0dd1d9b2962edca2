//! Batch evaluation of pipelines over a task suite.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use teamform_algorithm::{Pipeline, PipelineConfig, TeamFormationEngine};
use teamform_storage::{Dataset, DatasetStore, TaskSpec};
use tracing::{debug, info, warn};

use crate::error::{EvaluationError, Result};
use crate::id::RunId;
use crate::metrics::{summarize, EvaluationRecord, TaskStatistics};

/// How often progress is logged, in evaluations.
const PROGRESS_EVERY: usize = 20;

/// Evaluation run settings.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Pipelines to compare
    pub pipelines: Vec<Pipeline>,
    /// Seed for Steiner start choices; entropy when unset
    pub seed: Option<u64>,
    /// Pipeline tunables
    pub pipeline: PipelineConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            pipelines: Pipeline::ALL.to_vec(),
            seed: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl EvaluationConfig {
    /// Set the pipelines.
    pub fn with_pipelines(mut self, pipelines: Vec<Pipeline>) -> Self {
        self.pipelines = pipelines;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the pipeline tunables.
    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline = config;
        self
    }
}

/// Result of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Run identifier
    pub run_id: RunId,
    /// When the run started
    pub created_at: DateTime<Utc>,
    /// Seed used for Steiner start choices
    pub seed: Option<u64>,
    /// Number of tasks evaluated per pipeline
    pub tasks: usize,
    /// Per pipeline, per `t` statistics
    pub summary: BTreeMap<Pipeline, BTreeMap<usize, TaskStatistics>>,
    /// Every individual record
    pub records: Vec<EvaluationRecord>,
}

/// Runs pipelines over tasks and aggregates the results.
pub struct Evaluator<'a> {
    dataset: &'a Dataset,
    config: EvaluationConfig,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over `dataset`.
    pub fn new(dataset: &'a Dataset, config: EvaluationConfig) -> Self {
        Self { dataset, config }
    }

    /// Evaluate one task with one pipeline.
    ///
    /// Pipeline errors become failed records.
    pub fn evaluate_task(&self, engine: &TeamFormationEngine<'_>, pipeline: Pipeline, task: &TaskSpec, rng: &mut StdRng) -> EvaluationRecord {
        let requirement = match task.requirement() {
            Ok(requirement) => requirement,
            Err(e) => return EvaluationRecord::failed(pipeline, task.t, task.s, task.skills.len(), e),
        };

        let started = Instant::now();
        let outcome = match engine.run(pipeline, &requirement, rng) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} evaluation failed: {}", pipeline, e);
                return EvaluationRecord::failed(pipeline, task.t, task.s, requirement.len(), e);
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        for diagnostic in &outcome.diagnostics {
            debug!("{}: {}", pipeline, diagnostic);
        }

        let team_size = outcome.team.len();
        // Single members cost nothing; an empty team has no defined cost.
        let communication_cost = match team_size {
            0 => None,
            1 => Some(0.0),
            _ => outcome.finite_cost(),
        };
        let covered_skills = outcome.team.covered_skills(self.dataset.skills(), &requirement).len();

        EvaluationRecord {
            pipeline,
            t: task.t,
            s: task.s,
            team_size,
            required_skills: requirement.len(),
            covered_skills,
            communication_cost,
            is_connected: outcome.connected,
            execution_time_secs: elapsed,
            success: covered_skills == requirement.len() && team_size > 0,
            error: None,
        }
    }

    /// Evaluate every configured pipeline on every task.
    pub fn run(&self, tasks: &[TaskSpec]) -> Result<EvaluationReport> {
        if tasks.is_empty() {
            return Err(EvaluationError::NoTasks);
        }
        if self.config.pipelines.is_empty() {
            return Err(EvaluationError::InvalidConfig("no pipelines selected".into()));
        }

        let engine = TeamFormationEngine::new(self.dataset.graph(), self.dataset.skills())?.with_config(self.config.pipeline);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let run_id = RunId::new();
        let created_at = Utc::now();
        let total = tasks.len() * self.config.pipelines.len();
        info!("Run {}: {} tasks x {} pipelines", run_id, tasks.len(), self.config.pipelines.len());

        let mut records = Vec::with_capacity(total);
        for &pipeline in &self.config.pipelines {
            info!("Evaluating {}", pipeline);
            for task in tasks {
                records.push(self.evaluate_task(&engine, pipeline, task, &mut rng));
                if records.len() % PROGRESS_EVERY == 0 {
                    info!("Progress: {}/{}", records.len(), total);
                }
            }
        }

        let summary = self
            .config
            .pipelines
            .iter()
            .map(|&pipeline| (pipeline, summarize(&records, pipeline)))
            .collect();

        Ok(EvaluationReport {
            run_id,
            created_at,
            seed: self.config.seed,
            tasks: tasks.len(),
            summary,
            records,
        })
    }

    /// Run and persist the report through `store`.
    pub async fn run_and_save<S: DatasetStore + ?Sized>(&self, tasks: &[TaskSpec], store: &S) -> Result<(EvaluationReport, PathBuf)> {
        let report = self.run(tasks)?;
        let value = serde_json::to_value(&report)?;
        let path = store.save_report(&report.run_id.to_string(), &value).await?;
        info!("Report saved to {}", path.display());
        Ok((report, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamform_storage::{DatasetFile, EdgeRecord, EntityRecord, JsonDatasetStore};
    use tempfile::TempDir;

    fn dataset_file() -> DatasetFile {
        let entity = |id: &str, skills: &[&str]| EntityRecord {
            id: id.into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            categories: vec!["kdd".into()],
            in_graph: true,
        };
        let edge = |source: &str, target: &str, weight: f64| EdgeRecord {
            source: source.into(),
            target: target.into(),
            weight,
        };
        DatasetFile {
            entities: vec![
                entity("a", &["x"]),
                entity("b", &["y"]),
                entity("c", &["z"]),
                entity("solo", &["w"]),
            ],
            edges: vec![edge("a", "b", 0.5), edge("b", "c", 0.25)],
        }
    }

    fn task(skills: &[&str]) -> TaskSpec {
        TaskSpec {
            t: skills.len(),
            s: 1,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            categories: ["kdd".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_record_fields() {
        let dataset = Dataset::from_file(dataset_file()).unwrap();
        let evaluator = Evaluator::new(&dataset, EvaluationConfig::default().with_seed(3));
        let engine = TeamFormationEngine::new(dataset.graph(), dataset.skills()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let record = evaluator.evaluate_task(&engine, Pipeline::CoverSteiner, &task(&["x", "z"]), &mut rng);
        assert_eq!(record.team_size, 3);
        assert_eq!(record.communication_cost, Some(0.75));
        assert_eq!(record.covered_skills, 2);
        assert!(record.success && record.is_connected);

        // Single member: cost zero.
        let record = evaluator.evaluate_task(&engine, Pipeline::EnhancedSteiner, &task(&["w"]), &mut rng);
        assert_eq!(record.team_size, 1);
        assert_eq!(record.communication_cost, Some(0.0));

        // Disconnected: no cost, still covering.
        let record = evaluator.evaluate_task(&engine, Pipeline::CoverSteiner, &task(&["x", "w"]), &mut rng);
        assert_eq!(record.communication_cost, None);
        assert!(!record.is_connected);
        assert!(record.success);

        // Nobody offers the skill: empty team, not a success.
        let record = evaluator.evaluate_task(&engine, Pipeline::ImprovedEnhancedSteiner, &task(&["ghost"]), &mut rng);
        assert_eq!(record.team_size, 0);
        assert_eq!(record.communication_cost, None);
        assert!(!record.success);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_pipeline_error_becomes_failed_record() {
        let dataset = Dataset::from_file(dataset_file()).unwrap();
        let pipeline = PipelineConfig::default().with_bridge_weight(teamform_algorithm::BridgeWeight::new(0.5).unwrap());
        let config = EvaluationConfig::default()
            .with_seed(1)
            .with_pipelines(vec![Pipeline::EnhancedSteiner])
            .with_pipeline_config(pipeline);
        let report = Evaluator::new(&dataset, config).run(&[task(&["x", "y"])]).unwrap();
        assert_eq!(report.records.len(), 1);
        assert!(report.records[0].error.is_some());
        assert!(!report.records[0].success);
    }

    #[test]
    fn test_run_summary_and_seed() {
        let dataset = Dataset::from_file(dataset_file()).unwrap();
        let tasks = vec![task(&["x", "y"]), task(&["y", "z"]), task(&["x", "y", "z"])];
        let config = EvaluationConfig::default().with_seed(11);

        let report = Evaluator::new(&dataset, config.clone()).run(&tasks).unwrap();
        assert_eq!(report.records.len(), 12);
        assert_eq!(report.summary.len(), 4);
        for pipeline in Pipeline::ALL {
            let by_t = &report.summary[&pipeline];
            assert_eq!(by_t[&2].total_tasks, 2);
            assert_eq!(by_t[&3].success_rate, 100.0);
        }

        let again = Evaluator::new(&dataset, config).run(&tasks).unwrap();
        let teams = |r: &EvaluationReport| r.records.iter().map(|x| x.team_size).collect::<Vec<_>>();
        assert_eq!(teams(&report), teams(&again));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let dataset = Dataset::from_file(dataset_file()).unwrap();
        let evaluator = Evaluator::new(&dataset, EvaluationConfig::default());
        assert!(matches!(evaluator.run(&[]), Err(EvaluationError::NoTasks)));

        let evaluator = Evaluator::new(&dataset, EvaluationConfig::default().with_pipelines(vec![]));
        assert!(matches!(evaluator.run(&[task(&["x"])]), Err(EvaluationError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_run_and_save() {
        let dir = TempDir::new().unwrap();
        let store = JsonDatasetStore::new(dir.path()).await.unwrap();
        store.save_dataset(&dataset_file()).await.unwrap();
        let dataset = store.load_dataset().await.unwrap();

        let evaluator = Evaluator::new(&dataset, EvaluationConfig::default().with_seed(5));
        let (report, path) = evaluator.run_and_save(&[task(&["x", "z"])], &store).await.unwrap();
        assert!(path.exists());

        let saved = store.load_report(&report.run_id.to_string()).await.unwrap().unwrap();
        let parsed: EvaluationReport = serde_json::from_value(saved).unwrap();
        assert_eq!(parsed.records, report.records);
        assert_eq!(store.list_reports().await.unwrap(), [report.run_id.to_string()]);
    }
}

//! Configuration loading.
//!
//! Sources, lowest priority first: built-in defaults, `teamform.toml` (or
//! the file given with `--config`), then `TEAMFORM_*` environment variables.
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use teamform_algorithm::{BridgeWeight, Pipeline, PipelineConfig, SearchBudget};
use teamform_evaluation::SuiteConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "teamform.toml";

/// `[evaluation]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSection {
    /// Task sizes
    pub t_values: Vec<usize>,
    /// Category counts
    pub s_values: Vec<usize>,
    /// Tasks per (t, s) bucket
    pub tasks_per_bucket: usize,
    /// Draw attempts per bucket
    pub max_trials: usize,
    /// Task generator seed
    pub task_seed: u64,
    /// Pipelines to compare
    pub pipelines: Vec<Pipeline>,
}

impl Default for EvaluationSection {
    fn default() -> Self {
        let suite = SuiteConfig::default();
        Self {
            t_values: suite.t_values,
            s_values: suite.s_values,
            tasks_per_bucket: suite.tasks_per_bucket,
            max_trials: suite.max_trials,
            task_seed: suite.seed,
            pipelines: Pipeline::ALL.to_vec(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding dataset.json, tasks.json and reports/
    pub dataset_dir: PathBuf,
    /// Seed for Steiner start choices; entropy when unset
    pub seed: Option<u64>,
    /// Skill bridge weight `D`
    pub bridge_weight: f64,
    /// Reject bridge weights not exceeding the total edge weight
    pub enforce_bridge_bound: bool,
    /// Steiner growth round limit
    pub max_iterations: Option<usize>,
    /// Steiner growth time limit in milliseconds
    pub time_limit_ms: Option<u64>,
    /// Default log filter
    pub log_level: String,
    /// Evaluation settings
    pub evaluation: EvaluationSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("data"),
            seed: None,
            bridge_weight: BridgeWeight::DEFAULT,
            enforce_bridge_bound: true,
            max_iterations: None,
            time_limit_ms: None,
            log_level: "info".to_string(),
            evaluation: EvaluationSection::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources.
    ///
    /// A missing config file is not an error.
    pub fn load(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = config_path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("TEAMFORM_").split("__"))
            .extract()
    }

    /// Pipeline tunables from the flat settings.
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut budget = SearchBudget::new();
        if let Some(max) = self.max_iterations {
            budget = budget.with_max_iterations(max);
        }
        if let Some(ms) = self.time_limit_ms {
            budget = budget.with_time_limit(Duration::from_millis(ms));
        }
        Ok(PipelineConfig::default()
            .with_bridge_weight(BridgeWeight::new(self.bridge_weight)?)
            .with_bridge_bound(self.enforce_bridge_bound)
            .with_budget(budget))
    }

    /// Task suite shape.
    pub fn suite_config(&self) -> SuiteConfig {
        SuiteConfig {
            t_values: self.evaluation.t_values.clone(),
            s_values: self.evaluation.s_values.clone(),
            tasks_per_bucket: self.evaluation.tasks_per_bucket,
            max_trials: self.evaluation.max_trials,
            seed: self.evaluation.task_seed,
        }
    }
}

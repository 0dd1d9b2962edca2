//! Per-task evaluation records and their aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use teamform_algorithm::Pipeline;

/// Outcome of one pipeline on one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Pipeline that ran
    pub pipeline: Pipeline,
    /// Task size
    pub t: usize,
    /// Task category count
    pub s: usize,
    /// Selected team size
    pub team_size: usize,
    /// Number of required skills
    pub required_skills: usize,
    /// Number of required skills the team covers
    pub covered_skills: usize,
    /// Communication cost; `None` when undefined (disconnected or empty team)
    pub communication_cost: Option<f64>,
    /// Whether the team is connected
    pub is_connected: bool,
    /// Wall-clock time of the pipeline run
    pub execution_time_secs: f64,
    /// Every required skill covered by a non-empty team
    pub success: bool,
    /// Pipeline error, if the run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationRecord {
    /// Record for a pipeline run that returned an error.
    pub fn failed(pipeline: Pipeline, t: usize, s: usize, required_skills: usize, error: impl ToString) -> Self {
        Self {
            pipeline,
            t,
            s,
            team_size: 0,
            required_skills,
            covered_skills: 0,
            communication_cost: None,
            is_connected: false,
            execution_time_secs: 0.0,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregates over all records of one pipeline with the same `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatistics {
    /// Mean team size
    pub average_team_size: f64,
    /// Mean cost over records with a defined cost and a non-empty team
    pub average_communication_cost: Option<f64>,
    /// Share of successful records, in percent
    pub success_rate: f64,
    /// Mean execution time in seconds
    pub average_execution_time: f64,
    /// Records contributing to the cost mean, as `k/n`
    pub valid_cost_samples: String,
    /// Number of records
    pub total_tasks: usize,
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Summarize the records of `pipeline`, grouped by `t`.
pub fn summarize(records: &[EvaluationRecord], pipeline: Pipeline) -> BTreeMap<usize, TaskStatistics> {
    let mut by_t: BTreeMap<usize, Vec<&EvaluationRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.pipeline == pipeline) {
        by_t.entry(record.t).or_default().push(record);
    }

    by_t.into_iter()
        .map(|(t, group)| {
            let n = group.len() as f64;
            let valid: Vec<f64> = group
                .iter()
                .filter(|r| r.team_size > 0)
                .filter_map(|r| r.communication_cost)
                .collect();
            let average_cost = (!valid.is_empty()).then(|| valid.iter().sum::<f64>() / valid.len() as f64);
            let successes = group.iter().filter(|r| r.success).count() as f64;

            let stats = TaskStatistics {
                average_team_size: round_to(group.iter().map(|r| r.team_size as f64).sum::<f64>() / n, 2),
                average_communication_cost: average_cost.map(|c| round_to(c, 2)),
                success_rate: round_to(successes / n * 100.0, 1),
                average_execution_time: round_to(group.iter().map(|r| r.execution_time_secs).sum::<f64>() / n, 3),
                valid_cost_samples: format!("{}/{}", valid.len(), group.len()),
                total_tasks: group.len(),
            };
            (t, stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pipeline: Pipeline, t: usize, team_size: usize, cost: Option<f64>, success: bool) -> EvaluationRecord {
        EvaluationRecord {
            pipeline,
            t,
            s: 1,
            team_size,
            required_skills: t,
            covered_skills: if success { t } else { 0 },
            communication_cost: cost,
            is_connected: cost.is_some(),
            execution_time_secs: 0.002,
            success,
            error: None,
        }
    }

    #[test]
    fn test_summarize_groups_by_t() {
        let p = Pipeline::CoverSteiner;
        let records = vec![
            record(p, 2, 2, Some(1.0), true),
            record(p, 2, 3, Some(2.0), true),
            record(p, 2, 4, None, false),
            record(p, 4, 1, Some(0.0), true),
            record(Pipeline::EnhancedSteiner, 2, 9, Some(9.0), true),
        ];
        let summary = summarize(&records, p);
        assert_eq!(summary.len(), 2);

        let two = &summary[&2];
        assert_eq!(two.total_tasks, 3);
        assert_eq!(two.average_team_size, 3.0);
        assert_eq!(two.average_communication_cost, Some(1.5));
        assert_eq!(two.success_rate, 66.7);
        assert_eq!(two.valid_cost_samples, "2/3");
        assert_eq!(two.average_execution_time, 0.002);

        assert_eq!(summary[&4].average_communication_cost, Some(0.0));
    }

    #[test]
    fn test_no_valid_cost() {
        let p = Pipeline::GraphAwareCoverSteiner;
        let records = vec![
            record(p, 6, 0, None, false),
            EvaluationRecord::failed(p, 6, 1, 6, "boom"),
        ];
        let stats = &summarize(&records, p)[&6];
        assert_eq!(stats.average_communication_cost, None);
        assert_eq!(stats.valid_cost_samples, "0/2");
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_failed_record_serializes_error() {
        let record = EvaluationRecord::failed(Pipeline::EnhancedSteiner, 2, 1, 2, "bad bridge");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["error"], "bad bridge");
        assert_eq!(json["pipeline"], "enhanced-steiner");
        assert!(json["communication_cost"].is_null());
    }
}

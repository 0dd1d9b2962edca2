//! teamform CLI - team formation over collaboration networks.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use teamform_algorithm::{Pipeline, TeamFormationEngine, TeamOutcome};
use teamform_core::SkillRequirement;
use teamform_evaluation::{EvaluationConfig, EvaluationReport, Evaluator, TaskGenerator};
use teamform_storage::{DatasetStore, JsonDatasetStore, SkillNormalizer};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "teamform")]
#[command(about = "Team formation over collaboration networks", long_about = None)]
struct Cli {
    /// Config file (default: ./teamform.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dataset directory
    #[arg(long, global = true)]
    dataset_dir: Option<PathBuf>,
    /// Log filter, e.g. "debug" or "teamform_evaluation=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Random seed
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Form a team for a set of skills
    Solve {
        /// Required skills, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        skills: Vec<String>,
        /// Pipeline to run
        #[arg(long, default_value = "improved-enhanced-steiner")]
        algorithm: Pipeline,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a task suite and write tasks.json
    GenerateTasks {
        /// Tasks per (t, s) bucket
        #[arg(long)]
        tasks_per_bucket: Option<usize>,
    },
    /// Evaluate pipelines over the saved task suite
    Evaluate {
        /// Pipelines to compare, comma separated (default: from config)
        #[arg(long, value_delimiter = ',')]
        algorithm: Vec<Pipeline>,
    },
    /// Show dataset statistics
    Inspect,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.dataset_dir {
        config.dataset_dir = dir;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    let filter = match cli.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    debug!("Configuration: {:?}", config);

    let store = JsonDatasetStore::new(&config.dataset_dir).await?;

    match cli.command {
        Commands::Solve { skills, algorithm, json } => {
            let dataset = store.load_dataset().await?;
            let normalizer = SkillNormalizer::new()?;
            let requirement = SkillRequirement::new(skills.iter().map(|s| normalizer.normalize(s)))?;

            let engine = TeamFormationEngine::new(dataset.graph(), dataset.skills())?.with_config(config.pipeline_config()?);
            let outcome = engine.run_seeded(algorithm, &requirement, config.seed)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }
        Commands::GenerateTasks { tasks_per_bucket } => {
            let dataset = store.load_dataset().await?;
            let mut suite = config.suite_config();
            if let Some(n) = tasks_per_bucket {
                suite.tasks_per_bucket = n;
            }
            if let Some(seed) = cli.seed {
                suite.seed = seed;
            }

            let mut generator = TaskGenerator::new(&dataset, suite.seed);
            for (category, size) in generator.category_sizes() {
                debug!("Category {}: {} skills", category, size);
            }
            let tasks = generator.generate_suite(&suite)?;
            store.save_tasks(&tasks).await?;
            println!("Generated {} tasks", tasks.len());
        }
        Commands::Evaluate { algorithm } => {
            let dataset = store.load_dataset().await?;
            let Some(tasks) = store.load_tasks().await? else {
                bail!("No tasks.json in {}; run generate-tasks first", config.dataset_dir.display());
            };

            let pipelines = if algorithm.is_empty() {
                config.evaluation.pipelines.clone()
            } else {
                algorithm
            };
            let mut eval_config = EvaluationConfig::default()
                .with_pipelines(pipelines)
                .with_pipeline_config(config.pipeline_config()?);
            if let Some(seed) = config.seed {
                eval_config = eval_config.with_seed(seed);
            }

            let evaluator = Evaluator::new(&dataset, eval_config);
            let (report, path) = evaluator.run_and_save(&tasks, &store).await?;
            print_report(&report);
            println!("Report: {}", path.display());
        }
        Commands::Inspect => {
            let dataset = store.load_dataset().await?;
            let graph = dataset.graph();
            let components = graph.connected_components();
            let largest = components.iter().map(|c| c.len()).max().unwrap_or(0);

            println!("Dataset: {}", config.dataset_dir.display());
            println!("  Nodes: {}", graph.node_count());
            println!("  Edges: {}", graph.edge_count());
            println!("  Total weight: {:.3}", graph.total_weight());
            println!("  Entities: {}", dataset.skills().len());
            println!("  Skills: {}", dataset.skills().all_skills().len());
            println!("  Skills in graph: {}", dataset.graph_skills().len());
            println!("  Categories: {}", dataset.category_skills().len());
            println!("  Components: {} (largest {})", components.len(), largest);
        }
    }

    info!("Done");
    Ok(())
}

fn format_cost(cost: Option<f64>) -> String {
    match cost {
        Some(cost) => format!("{:.3}", cost),
        None => "inf".to_string(),
    }
}

fn print_outcome(outcome: &TeamOutcome) {
    println!("Pipeline: {}", outcome.pipeline);
    println!("Team ({})", outcome.team.len());
    for member in outcome.team.iter() {
        println!("  {}", member);
    }
    println!("Cost: {}", format_cost(outcome.finite_cost()));
    println!("Connected: {}", outcome.connected);
    for diagnostic in &outcome.diagnostics {
        println!("Warning: {}", diagnostic);
    }
}

fn print_report(report: &EvaluationReport) {
    println!("Run {} ({} tasks)", report.run_id, report.tasks);
    for (pipeline, by_t) in &report.summary {
        println!("{}", pipeline);
        println!("  {:>4} {:>8} {:>10} {:>8} {:>9} {:>9}", "t", "size", "cost", "success", "time(s)", "samples");
        for (t, stats) in by_t {
            println!(
                "  {:>4} {:>8.2} {:>10} {:>7.1}% {:>9.3} {:>9}",
                t,
                stats.average_team_size,
                format_cost(stats.average_communication_cost),
                stats.success_rate,
                stats.average_execution_time,
                stats.valid_cost_samples,
            );
        }
    }
}

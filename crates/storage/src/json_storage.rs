//! JSON file storage implementation.
//!
//! Layout under the dataset directory:
//!
//! ```text
//! dataset.json           entities and edges
//! tasks.json             generated task suite
//! reports/<run-id>.json  evaluation reports
//! ```

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::{DatasetStore, Result, StorageError};
use crate::dataset::{Dataset, DatasetFile, TaskSpec};

const DATASET_FILE: &str = "dataset.json";
const TASKS_FILE: &str = "tasks.json";
const REPORTS_DIR: &str = "reports";

/// File-based JSON storage backend.
#[derive(Debug, Clone)]
pub struct JsonDatasetStore {
    root: PathBuf,
}

impl JsonDatasetStore {
    /// Open storage rooted at `root`, creating the directories it needs.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(REPORTS_DIR)).await?;
        Ok(Self { root })
    }

    /// The dataset directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dataset_path(&self) -> PathBuf {
        self.root.join(DATASET_FILE)
    }
    fn tasks_path(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }
    fn report_path(&self, run_id: &str) -> PathBuf {
        self.root.join(REPORTS_DIR).join(format!("{}.json", run_id))
    }
}

#[async_trait::async_trait]
impl DatasetStore for JsonDatasetStore {
    async fn load_dataset(&self) -> Result<Dataset> {
        let path = self.dataset_path();
        let Some(file) = read_json::<DatasetFile>(&path).await? else {
            return Err(StorageError::NotFound(path.display().to_string()));
        };
        debug!(
            "Read {} entities and {} edges from {}",
            file.entities.len(),
            file.edges.len(),
            path.display()
        );
        let dataset = Dataset::from_file(file)?;
        info!(
            "Loaded dataset: {} nodes, {} edges, {} entities",
            dataset.graph().node_count(),
            dataset.graph().edge_count(),
            dataset.skills().len()
        );
        Ok(dataset)
    }

    async fn save_dataset(&self, file: &DatasetFile) -> Result<()> {
        write_json(&self.dataset_path(), file).await
    }

    async fn load_tasks(&self) -> Result<Option<Vec<TaskSpec>>> {
        read_json(&self.tasks_path()).await
    }

    async fn save_tasks(&self, tasks: &[TaskSpec]) -> Result<()> {
        write_json(&self.tasks_path(), &tasks).await?;
        info!("Saved {} tasks to {}", tasks.len(), self.tasks_path().display());
        Ok(())
    }

    async fn save_report(&self, run_id: &str, report: &serde_json::Value) -> Result<PathBuf> {
        let path = self.report_path(run_id);
        write_json(&path, report).await?;
        Ok(path)
    }

    async fn load_report(&self, run_id: &str) -> Result<Option<serde_json::Value>> {
        read_json(&self.report_path(run_id)).await
    }

    async fn list_reports(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut rd = fs::read_dir(self.root.join(REPORTS_DIR)).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        // Run ids are ULIDs, so lexical order is creation order.
        ids.sort();
        Ok(ids)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}

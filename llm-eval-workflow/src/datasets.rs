use async_trait::async_trait;
use llm_eval_core::{
    CoreError, Dataset, DatasetConfig, DatasetExample, DatasetProvider, InMemoryDataset, Result,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads `<data_dir>/<path>` (default `<alias>.jsonl`): one
/// `{"messages": [...]}` object per line, blank lines ignored.
#[derive(Debug, Clone)]
pub struct JsonlDatasetProvider {
    data_dir: PathBuf,
}

impl JsonlDatasetProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn dataset_path(&self, config: &DatasetConfig) -> PathBuf {
        match &config.path {
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join(format!("{}.jsonl", config.alias)),
        }
    }
}

/// Parses JSONL content, stopping after `limit` examples.
pub fn parse_jsonl(content: &str, source: &Path, limit: Option<usize>) -> Result<Vec<DatasetExample>> {
    let mut examples = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if limit.is_some_and(|max| examples.len() >= max) {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let example: DatasetExample = serde_json::from_str(line).map_err(|e| {
            CoreError::Serialization(format!("{}:{}: {}", source.display(), line_no + 1, e))
        })?;
        examples.push(example);
    }

    Ok(examples)
}

#[async_trait]
impl DatasetProvider for JsonlDatasetProvider {
    async fn create_dataset(&self, config: &DatasetConfig) -> Result<Arc<dyn Dataset>> {
        let path = self.dataset_path(config);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::NotFound(format!("dataset file {}", path.display()))
            } else {
                CoreError::Persistence(format!("{}: {}", path.display(), e))
            }
        })?;

        let examples = parse_jsonl(&content, &path, config.max_samples)?;
        tracing::debug!("Loaded {} examples from {}", examples.len(), path.display());

        Ok(Arc::new(InMemoryDataset::new(examples)))
    }
}

/// Datasets registered up front by alias.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatasetProvider {
    datasets: HashMap<String, Arc<InMemoryDataset>>,
}

impl InMemoryDatasetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, alias: impl Into<String>, dataset: InMemoryDataset) -> Self {
        self.datasets.insert(alias.into(), Arc::new(dataset));
        self
    }
}

#[async_trait]
impl DatasetProvider for InMemoryDatasetProvider {
    async fn create_dataset(&self, config: &DatasetConfig) -> Result<Arc<dyn Dataset>> {
        let dataset = self
            .datasets
            .get(&config.alias)
            .ok_or_else(|| CoreError::NotFound(format!("dataset '{}'", config.alias)))?;

        match config.max_samples {
            Some(max) if max < dataset.len() => Ok(Arc::new(InMemoryDataset::new(
                dataset.examples()[..max].to_vec(),
            ))),
            _ => Ok(Arc::clone(dataset) as Arc<dyn Dataset>),
        }
    }
}

//! Post-processing that runs only on the coordinator rank.

use llm_eval_core::{metric_key, DatasetConfig, Result, Sample, Scorer};
use std::path::PathBuf;
use std::sync::Arc;

use crate::artifact::write_samples;
use crate::order::restore_order;

/// What the coordinator produced for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOutcome {
    pub alias: String,
    /// Samples in dataset order.
    pub samples: Vec<Sample>,
    /// `(metric key, score)` when the dataset has an eval config.
    pub metric: Option<(String, f64)>,
    pub artifact: Option<PathBuf>,
}

pub struct CoordinatorStage {
    scorer: Arc<dyn Scorer>,
    output_dir: Option<PathBuf>,
}

impl CoordinatorStage {
    pub fn new(scorer: Arc<dyn Scorer>, output_dir: Option<PathBuf>) -> Self {
        Self { scorer, output_dir }
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    /// Orders the gathered list, scores it and writes the artifact.
    pub async fn finalize(
        &self,
        config: &DatasetConfig,
        gathered: Vec<Sample>,
        expected: usize,
    ) -> Result<DatasetOutcome> {
        let samples = restore_order(gathered, expected)?;
        let alias = config.alias.as_str();

        let metric = match &config.eval_config {
            Some(eval_config) => {
                let result = self.scorer.evaluate(&samples, eval_config).await?;
                tracing::info!(
                    "Dataset: {}, Metric: {}, Score: {:.2}",
                    alias,
                    eval_config.metric,
                    result.score
                );
                Some((metric_key(alias, &eval_config.metric), result.score))
            }
            None => None,
        };

        let artifact = match &self.output_dir {
            Some(dir) => {
                let path = write_samples(dir, alias, &samples).await?;
                tracing::info!("Results saved to {}", path.display());
                Some(path)
            }
            None => None,
        };

        Ok(DatasetOutcome {
            alias: alias.to_string(),
            samples,
            metric,
            artifact,
        })
    }
}

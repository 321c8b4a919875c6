use llm_eval_core::{
    check_dataset_configs, DatasetConfig, DatasetProvider, EvalReport, InferenceBackend, Result,
    Scorer, Topology,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

use crate::batch::{BatchRunner, InferencePolicy};
use crate::coordinator::{CoordinatorStage, DatasetOutcome};
use crate::gather::{gather_samples, Collective};
use crate::shard::shard_indices;

/// Runs every dataset configuration through shard → batch → gather, then
/// hands the gathered list to the coordinator stage.
///
/// Every rank runs the same driver with its own collective handle; all of
/// them must be given the same configuration list.
pub struct EvaluationDriver {
    datasets: Arc<dyn DatasetProvider>,
    runner: BatchRunner,
    collective: Arc<dyn Collective>,
    coordinator: CoordinatorStage,
}

impl EvaluationDriver {
    pub fn new(
        datasets: Arc<dyn DatasetProvider>,
        backend: Arc<dyn InferenceBackend>,
        scorer: Arc<dyn Scorer>,
        collective: Arc<dyn Collective>,
    ) -> Self {
        Self {
            datasets,
            runner: BatchRunner::new(backend),
            collective,
            coordinator: CoordinatorStage::new(scorer, None),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.coordinator = self.coordinator.with_output_dir(output_dir.into());
        self
    }

    pub fn with_policy(mut self, policy: InferencePolicy) -> Self {
        self.runner = self.runner.with_policy(policy);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.runner = self.runner.with_progress(show_progress);
        self
    }

    pub fn topology(&self) -> Topology {
        self.collective.topology()
    }

    pub async fn run(&self, configs: &[DatasetConfig]) -> Result<EvalReport> {
        check_dataset_configs(configs)?;

        let mut report = EvalReport::default();
        for config in configs {
            if let Some(outcome) = self.evaluate_dataset(config).await? {
                if let Some((key, score)) = outcome.metric {
                    report.metrics.insert(key, score);
                }
                if let Some(path) = outcome.artifact {
                    report.output_files.push(path);
                }
            }
        }

        Ok(report)
    }

    /// One dataset. Returns `None` on every rank but the coordinator.
    pub async fn evaluate_dataset(&self, config: &DatasetConfig) -> Result<Option<DatasetOutcome>> {
        let topology = self.topology();
        let started = Instant::now();
        tracing::info!(rank = topology.local_rank(), "Evaluating dataset: {}", config.alias);

        let dataset = self.datasets.create_dataset(config).await?;
        let shard = shard_indices(dataset.len(), config.batch_size, topology)?;
        tracing::debug!(
            rank = topology.local_rank(),
            dataset_size = dataset.len(),
            owned = shard.len(),
            batches = shard.num_batches(),
            "Shard assigned"
        );

        let local = self
            .runner
            .run(dataset.as_ref(), &shard, &config.generation_params(), topology)
            .await?;

        let Some(gathered) = gather_samples(self.collective.as_ref(), local, dataset.len()).await? else {
            tracing::debug!(rank = topology.local_rank(), "Handed results to coordinator");
            return Ok(None);
        };

        let outcome = self
            .coordinator
            .finalize(config, gathered, dataset.len())
            .await?;
        tracing::info!(
            "Finished {} ({} samples) in {:?}",
            config.alias,
            outcome.samples.len(),
            started.elapsed()
        );

        Ok(Some(outcome))
    }
}

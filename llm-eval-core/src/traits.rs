use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Completion, DatasetConfig, DatasetExample, EvalConfig, EvalResult, GenerationParams, Message, Sample};
use crate::error::Result;

/// Per-sample metric formula.
#[async_trait]
pub trait MetricCalculator {
    type Input;
    type Output;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Model inference. Called once per batch with the label already stripped
/// from every conversation; must return one completion per conversation,
/// in the same order.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn infer_batch(
        &self,
        conversations: &[Vec<Message>],
        params: &GenerationParams,
    ) -> Result<Vec<Completion>>;
}

/// Read-only, randomly addressable collection of labeled examples.
pub trait Dataset: Send + Sync {
    fn len(&self) -> usize;

    fn example(&self, index: usize) -> Option<&DatasetExample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the dataset for one configuration. Every rank builds its own copy.
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    async fn create_dataset(&self, config: &DatasetConfig) -> Result<Arc<dyn Dataset>>;
}

/// Aggregate scoring over the full, ordered sample list.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn evaluate(&self, samples: &[Sample], config: &EvalConfig) -> Result<EvalResult>;
}

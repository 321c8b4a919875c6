use indicatif::{ProgressBar, ProgressStyle};
use llm_eval_core::{
    Completion, CoreError, Dataset, GenerationParams, InferenceBackend, LabeledPrompt, Message,
    Result, Sample, Topology,
};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

use crate::shard::Shard;

/// How inference calls are bounded and retried.
///
/// The default waits forever and never retries: a stalled backend on one
/// rank stalls the gather for every rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferencePolicy {
    /// Deadline for a single `infer_batch` call.
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further attempt.
    pub retry_backoff: Duration,
}

impl Default for InferencePolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Runs one rank's shard through the inference backend, batch by batch.
pub struct BatchRunner {
    backend: Arc<dyn InferenceBackend>,
    policy: InferencePolicy,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            policy: InferencePolicy::default(),
            show_progress: true,
        }
    }

    pub fn with_policy(mut self, policy: InferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(
        &self,
        dataset: &dyn Dataset,
        shard: &Shard,
        params: &GenerationParams,
        topology: Topology,
    ) -> Result<Vec<Sample>> {
        let progress = self.progress_bar(shard, topology);
        let mut results = Vec::with_capacity(shard.len());

        for (batch_no, batch) in shard.batches().enumerate() {
            // Every label is checked before the backend sees the batch.
            let prompts = batch
                .iter()
                .map(|&index| {
                    let example = dataset
                        .example(index)
                        .ok_or_else(|| CoreError::NotFound(format!("sample {}", index)))?;
                    Ok((index, example.split_label(index)?))
                })
                .collect::<Result<Vec<(usize, LabeledPrompt<'_>)>>>()?;

            let conversations: Vec<Vec<Message>> = prompts
                .iter()
                .map(|(_, prompt)| prompt.conversation.to_vec())
                .collect();

            let completions = self.infer(&conversations, params).await?;
            if completions.len() != prompts.len() {
                return Err(CoreError::Inference(format!(
                    "backend returned {} completions for a batch of {}",
                    completions.len(),
                    prompts.len()
                )));
            }

            results.extend(prompts.iter().zip(completions).map(|((index, prompt), completion)| {
                Sample::new(*index, prompt.question(), prompt.reference, completion.text)
            }));

            tracing::debug!(
                rank = topology.local_rank(),
                batch = batch_no,
                size = batch.len(),
                "Batch complete"
            );

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(results)
    }

    async fn infer(
        &self,
        conversations: &[Vec<Message>],
        params: &GenerationParams,
    ) -> Result<Vec<Completion>> {
        let mut attempt: u32 = 0;

        loop {
            match self.infer_once(conversations, params).await {
                Ok(completions) => return Ok(completions),
                Err(e) if attempt < self.policy.max_retries && !e.is_input_error() => {
                    let delay = self
                        .policy
                        .retry_backoff
                        .saturating_mul(1u32 << attempt.min(16));
                    tracing::warn!(
                        "Inference attempt {} failed: {}, retrying in {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn infer_once(
        &self,
        conversations: &[Vec<Message>],
        params: &GenerationParams,
    ) -> Result<Vec<Completion>> {
        let call = self.backend.infer_batch(conversations, params);
        match self.policy.timeout {
            Some(limit) => timeout(limit, call).await.map_err(|_| {
                CoreError::Timeout(format!("inference batch exceeded {:?}", limit))
            })?,
            None => call.await,
        }
    }

    /// Coordinator-only batch counter.
    fn progress_bar(&self, shard: &Shard, topology: Topology) -> Option<ProgressBar> {
        if !self.show_progress || !topology.is_coordinator() {
            return None;
        }

        let pb = ProgressBar::new(shard.num_batches() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} batches {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
        }
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_never_retries() {
        let policy = InferencePolicy::default();
        assert_eq!(policy.timeout, None);
        assert_eq!(policy.max_retries, 0);
    }
}

//! Collective exchange of per-rank results.

pub mod file;
pub mod in_process;
pub mod local;

pub use file::*;
pub use in_process::*;
pub use local::*;

use async_trait::async_trait;
use llm_eval_core::{CoreError, Result, Sample, Topology};

/// Gather-to-one primitive.
///
/// `exchange` is a full barrier: no rank returns before every rank has
/// called it. The coordinator receives the concatenation of all ranks'
/// lists (`Some`), every other rank receives `None`. Ranks must call it the
/// same number of times, in the same order.
#[async_trait]
pub trait Collective: Send + Sync {
    fn topology(&self) -> Topology;

    async fn exchange(&self, local: Vec<Sample>) -> Result<Option<Vec<Sample>>>;
}

/// Exchanges `local` and checks that the coordinator received exactly
/// `expected` samples.
pub async fn gather_samples(
    collective: &dyn Collective,
    local: Vec<Sample>,
    expected: usize,
) -> Result<Option<Vec<Sample>>> {
    let topology = collective.topology();
    tracing::debug!(
        rank = topology.local_rank(),
        local = local.len(),
        "Waiting at gather"
    );

    let merged = collective.exchange(local).await?;

    if let Some(samples) = &merged {
        if samples.len() != expected {
            return Err(CoreError::GatherMismatch {
                expected,
                actual: samples.len(),
            });
        }
        tracing::debug!(gathered = samples.len(), "Gather complete");
    }

    Ok(merged)
}

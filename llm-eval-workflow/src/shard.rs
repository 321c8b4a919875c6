//! Deterministic assignment of dataset indices to ranks.
//!
//! The index range is cut into consecutive batch blocks
//! `[k * batch_size, (k + 1) * batch_size)`; rank `r` owns every block `k`
//! with `k % world_size == r`. With `batch_size == 1` this is plain
//! round-robin (`index % world_size == rank`). Every rank applies the same
//! rule, so the shards are disjoint and together cover `0..dataset_size`.
//!
//! The final block may be short. It is processed like any other batch,
//! never dropped.

use llm_eval_core::{CoreError, Result, Topology};
use serde::Serialize;

/// The indices one rank owns, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shard {
    pub rank: usize,
    pub batch_size: usize,
    pub indices: Vec<usize>,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Batches in processing order. Only the last one can be short.
    pub fn batches(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.indices.chunks(self.batch_size)
    }

    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }
}

pub fn shard_indices(dataset_size: usize, batch_size: usize, topology: Topology) -> Result<Shard> {
    if batch_size == 0 {
        return Err(CoreError::Validation("batch_size must be at least 1".to_string()));
    }

    let world_size = topology.world_size();
    let rank = topology.local_rank();
    // A block never needs to be longer than the dataset; only block 0 exists then.
    let block = batch_size.min(dataset_size.max(1));
    let stride = block.checked_mul(world_size).ok_or_else(|| {
        CoreError::Validation(format!(
            "batch_size {} times world_size {} overflows",
            batch_size, world_size
        ))
    })?;

    let indices = (rank * block..dataset_size)
        .step_by(stride)
        .flat_map(|start| start..start.saturating_add(block).min(dataset_size))
        .collect();

    Ok(Shard {
        rank,
        batch_size,
        indices,
    })
}

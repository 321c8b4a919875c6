//! `llm-eval shard`: print the indices a rank would evaluate.

use anyhow::Result;
use clap::Args;
use llm_eval_core::Topology;
use llm_eval_workflow::shard_indices;

use crate::output::OutputWriter;

#[derive(Debug, Args)]
pub struct ShardArgs {
    /// Number of examples in the dataset
    #[arg(long)]
    pub dataset_size: usize,

    #[arg(long, default_value = "1")]
    pub batch_size: usize,

    #[arg(long, env = "WORLD_SIZE", default_value = "1")]
    pub world_size: usize,

    #[arg(long, env = "LOCAL_RANK", default_value = "0")]
    pub local_rank: usize,
}

pub fn execute(args: ShardArgs, output: &OutputWriter) -> Result<()> {
    let topology = Topology::new(args.world_size, args.local_rank)?;
    let shard = shard_indices(args.dataset_size, args.batch_size, topology)?;
    output.write_shard(&shard)
}

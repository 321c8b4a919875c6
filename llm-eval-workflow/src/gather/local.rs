use async_trait::async_trait;
use llm_eval_core::{Result, Sample, Topology};

use super::Collective;

/// Single-rank run: the local list already is the global list.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCollective;

#[async_trait]
impl Collective for LocalCollective {
    fn topology(&self) -> Topology {
        Topology::single()
    }

    async fn exchange(&self, local: Vec<Sample>) -> Result<Option<Vec<Sample>>> {
        Ok(Some(local))
    }
}

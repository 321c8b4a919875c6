use async_trait::async_trait;
use llm_eval_core::{CoreError, Result, Sample, Topology};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Barrier, Mutex};

use super::Collective;

struct Envelope {
    round: u64,
    rank: usize,
    samples: Vec<Sample>,
}

struct Group {
    barrier: Barrier,
    tx: mpsc::UnboundedSender<Envelope>,
    rx: Mutex<mpsc::UnboundedReceiver<Envelope>>,
}

/// Shared-memory collective for ranks running as tasks in one process.
///
/// Non-coordinators post their list to the coordinator over a channel, then
/// every rank meets at a barrier once the coordinator holds all lists.
pub struct InProcessCollective {
    topology: Topology,
    group: Arc<Group>,
    round: AtomicU64,
}

impl InProcessCollective {
    /// One handle per rank, indexed by rank.
    pub fn group(world_size: usize) -> Result<Vec<Self>> {
        let topologies = Topology::all(world_size)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let group = Arc::new(Group {
            barrier: Barrier::new(world_size),
            tx,
            rx: Mutex::new(rx),
        });

        Ok(topologies
            .into_iter()
            .map(|topology| Self {
                topology,
                group: Arc::clone(&group),
                round: AtomicU64::new(0),
            })
            .collect())
    }
}

#[async_trait]
impl Collective for InProcessCollective {
    fn topology(&self) -> Topology {
        self.topology
    }

    async fn exchange(&self, local: Vec<Sample>) -> Result<Option<Vec<Sample>>> {
        let round = self.round.fetch_add(1, Ordering::SeqCst);
        let rank = self.topology.local_rank();

        if !self.topology.is_coordinator() {
            self.group
                .tx
                .send(Envelope {
                    round,
                    rank,
                    samples: local,
                })
                .map_err(|_| CoreError::Transport("coordinator is gone".to_string()))?;
            self.group.barrier.wait().await;
            return Ok(None);
        }

        let world_size = self.topology.world_size();
        let mut parts = Vec::with_capacity(world_size);
        parts.push((rank, local));

        {
            let mut rx = self.group.rx.lock().await;
            while parts.len() < world_size {
                let envelope = rx
                    .recv()
                    .await
                    .ok_or_else(|| CoreError::Transport("rank channel closed".to_string()))?;
                if envelope.round != round {
                    return Err(CoreError::Transport(format!(
                        "rank {} sent round {} while gathering round {}",
                        envelope.rank, envelope.round, round
                    )));
                }
                parts.push((envelope.rank, envelope.samples));
            }
        }

        self.group.barrier.wait().await;

        parts.sort_by_key(|(rank, _)| *rank);
        Ok(Some(parts.into_iter().flat_map(|(_, samples)| samples).collect()))
    }
}

use async_trait::async_trait;
use llm_eval_core::{CoreError, Result, Sample, Topology};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{sleep, Duration, Instant};

use super::Collective;

/// File-based handoff through a directory every rank can reach.
///
/// Each exchange is one round directory. A rank writes
/// `round-NNNN/rank-R.json` atomically (write then rename) and polls until
/// all ranks' files exist; the coordinator then reads and concatenates
/// them in rank order. Files are left in place, so `root` must be fresh
/// for every run; a rank that finds its own file already present fails with
/// [`CoreError::Transport`] instead of joining a stale round.
pub struct FileCollective {
    topology: Topology,
    root: PathBuf,
    poll_interval: Duration,
    timeout: Option<Duration>,
    round: AtomicU64,
}

impl FileCollective {
    pub fn new(root: impl Into<PathBuf>, topology: Topology) -> Self {
        Self {
            topology,
            root: root.into(),
            poll_interval: Duration::from_millis(200),
            timeout: None,
            round: AtomicU64::new(0),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Fail with [`CoreError::Timeout`] instead of waiting forever for a
    /// stalled rank.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn round_dir(&self, round: u64) -> PathBuf {
        self.root.join(format!("round-{:04}", round))
    }

    fn rank_file(dir: &Path, rank: usize) -> PathBuf {
        dir.join(format!("rank-{}.json", rank))
    }

    async fn publish(&self, dir: &Path, local: &[Sample]) -> Result<()> {
        let rank = self.topology.local_rank();
        let target = Self::rank_file(dir, rank);
        // Only this rank ever writes `target`, so finding it means the
        // directory holds an earlier run's round.
        if tokio::fs::try_exists(&target).await.map_err(|e| transport(&target, e))? {
            return Err(CoreError::Transport(format!(
                "{} already exists; rendezvous directory {} was used by an earlier run",
                target.display(),
                self.root.display()
            )));
        }

        let payload = serde_json::to_vec(local)?;
        let tmp = dir.join(format!(".rank-{}.json.tmp", rank));

        tokio::fs::create_dir_all(dir).await.map_err(|e| transport(dir, e))?;
        tokio::fs::write(&tmp, payload).await.map_err(|e| transport(&tmp, e))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| transport(&tmp, e))?;
        Ok(())
    }

    async fn wait_for_all(&self, dir: &Path, round: u64) -> Result<()> {
        let started = Instant::now();

        loop {
            let mut missing = Vec::new();
            for rank in 0..self.topology.world_size() {
                let path = Self::rank_file(dir, rank);
                if !tokio::fs::try_exists(&path).await.map_err(|e| transport(&path, e))? {
                    missing.push(rank);
                }
            }

            if missing.is_empty() {
                return Ok(());
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    return Err(CoreError::Timeout(format!(
                        "gather round {} still waiting for ranks {:?} after {:?}",
                        round, missing, limit
                    )));
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Collective for FileCollective {
    fn topology(&self) -> Topology {
        self.topology
    }

    async fn exchange(&self, local: Vec<Sample>) -> Result<Option<Vec<Sample>>> {
        let round = self.round.fetch_add(1, Ordering::SeqCst);
        let dir = self.round_dir(round);

        self.publish(&dir, &local).await?;
        self.wait_for_all(&dir, round).await?;

        if !self.topology.is_coordinator() {
            return Ok(None);
        }

        let mut merged = Vec::new();
        for rank in 0..self.topology.world_size() {
            let path = Self::rank_file(&dir, rank);
            let bytes = tokio::fs::read(&path).await.map_err(|e| transport(&path, e))?;
            let part: Vec<Sample> = serde_json::from_slice(&bytes)?;
            merged.extend(part);
        }

        Ok(Some(merged))
    }
}

fn transport(path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Transport(format!("{}: {}", path.display(), err))
}

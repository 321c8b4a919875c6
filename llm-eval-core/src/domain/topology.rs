use serde::Serialize;
use std::fmt;

use crate::error::{CoreError, Result};

/// Rank that gathers, scores and persists results.
pub const COORDINATOR_RANK: usize = 0;

/// Position of this process in a multi-rank run. Supplied by the launcher.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Topology {
    world_size: usize,
    local_rank: usize,
}

impl Topology {
    pub fn new(world_size: usize, local_rank: usize) -> Result<Self> {
        if world_size == 0 {
            return Err(CoreError::Validation(
                "world_size must be at least 1".to_string(),
            ));
        }
        if local_rank >= world_size {
            return Err(CoreError::Validation(format!(
                "local_rank {} is out of range for world_size {}",
                local_rank, world_size
            )));
        }
        Ok(Self {
            world_size,
            local_rank,
        })
    }

    /// One rank that is also the coordinator.
    pub fn single() -> Self {
        Self {
            world_size: 1,
            local_rank: COORDINATOR_RANK,
        }
    }

    pub fn world_size(&self) -> usize {
        self.world_size
    }

    pub fn local_rank(&self) -> usize {
        self.local_rank
    }

    pub fn is_coordinator(&self) -> bool {
        self.local_rank == COORDINATOR_RANK
    }

    /// Every rank of a run with this world size.
    pub fn all(world_size: usize) -> Result<Vec<Self>> {
        (0..world_size.max(1))
            .map(|rank| Self::new(world_size, rank))
            .collect()
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::single()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank {}/{}", self.local_rank, self.world_size)
    }
}

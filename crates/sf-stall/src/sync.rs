//! Making replicas of one section identical across processes.
//!
//! Several processes may hold a replica of the same section. After each
//! step the owning replica publishes its snapshot and every other replica
//! overwrites its state with it. Transport is the host's business; the
//! [`ReplicaExchange`] trait is the seam.

use crate::error::{StallError, StallResult};
use crate::kind::ModelKind;
use crate::state::{AeroCoefficients, StateHistory};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Complete state of one model, as exchanged between replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSnapshot {
    pub kind: ModelKind,
    pub history: Option<StateHistory>,
    pub output: Option<AeroCoefficients>,
    pub evaluations: u64,
    pub reynolds: f64,
}

/// Channel between the owning replica and the others.
pub trait ReplicaExchange: Send + Sync {
    /// Called by the owner.
    fn publish(&self, snapshot: ReplicaSnapshot) -> StallResult<()>;

    /// Called by every other replica.
    fn fetch(&self) -> StallResult<ReplicaSnapshot>;
}

/// Single-slot mailbox for hosts running all replicas in one process.
///
/// Accepts one publish per round; call [`clear`](Self::clear) between
/// rounds.
#[derive(Debug, Default)]
pub struct InMemoryExchange {
    slot: Mutex<Option<ReplicaSnapshot>>,
}

impl InMemoryExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the mailbox for the next round.
    pub fn clear(&self) -> StallResult<()> {
        let mut slot = self.slot.lock().map_err(|_| StallError::Replica {
            what: "exchange mailbox poisoned",
        })?;
        *slot = None;
        Ok(())
    }
}

impl ReplicaExchange for InMemoryExchange {
    fn publish(&self, snapshot: ReplicaSnapshot) -> StallResult<()> {
        let mut slot = self.slot.lock().map_err(|_| StallError::Replica {
            what: "exchange mailbox poisoned",
        })?;
        if slot.is_some() {
            return Err(StallError::Replica {
                what: "a second replica claimed ownership",
            });
        }
        *slot = Some(snapshot);
        Ok(())
    }

    fn fetch(&self) -> StallResult<ReplicaSnapshot> {
        let slot = self.slot.lock().map_err(|_| StallError::Replica {
            what: "exchange mailbox poisoned",
        })?;
        slot.clone().ok_or(StallError::Replica {
            what: "no snapshot published yet",
        })
    }
}

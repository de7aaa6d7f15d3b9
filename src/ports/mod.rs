//! Persistence port for the campaign store.
//! The store hands a full snapshot to the backend after every mutation and
//! reads it back once at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Campaign, Donation};
use crate::error::AppResult;

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk layout: one list per status partition plus the donation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Highest id ever handed out, so ids stay unique after deletions.
    pub next_id: u64,
    #[serde(default)]
    pub pending: Vec<Campaign>,
    #[serde(default)]
    pub approved: Vec<Campaign>,
    #[serde(default)]
    pub rejected: Vec<Campaign>,
    #[serde(default)]
    pub completed: Vec<Campaign>,
    #[serde(default)]
    pub donations: Vec<Donation>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_id: 0,
            pending: Vec::new(),
            approved: Vec::new(),
            rejected: Vec::new(),
            completed: Vec::new(),
            donations: Vec::new(),
        }
    }
}

/// Durable backing for `CampaignStore`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `None` when nothing has been written yet.
    async fn load(&self) -> AppResult<Option<Snapshot>>;

    async fn save(&self, snapshot: &Snapshot) -> AppResult<()>;
}

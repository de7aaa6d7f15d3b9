//! Authoritative campaign store.
//!
//! One map keyed by campaign id holds every record; status partitions are
//! filtered views over it. The full state is flushed to the snapshot backend
//! while the write guard is held, and a failed flush rolls the change back.

use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::{Campaign, CampaignId, CampaignStatus, Donation};
use crate::error::{AppError, AppResult};
use crate::ports::{Snapshot, SnapshotStore, SNAPSHOT_VERSION};
use crate::validation::{validate_donor_address, validate_idempotency_key, validate_positive_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// The id must be new.
    Insert,
    /// The id must already exist.
    Update,
}

#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub status: Option<CampaignStatus>,
    pub category: Option<String>,
}

impl CampaignFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn status(status: CampaignStatus) -> Self {
        Self {
            status: Some(status),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, campaign: &Campaign) -> bool {
        let status_ok = self.status.map_or(true, |s| campaign.status == s);
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| campaign.category.eq_ignore_ascii_case(c.trim()));
        status_ok && category_ok
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub campaigns: usize,
    pub donations: usize,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: u64,
    campaigns: BTreeMap<CampaignId, Campaign>,
    donations: Arc<Vec<Donation>>,
    idempotency: HashMap<String, usize>,
}

impl StoreState {
    fn from_snapshot(snapshot: Snapshot) -> AppResult<Self> {
        let mut state = StoreState {
            next_id: snapshot.next_id,
            ..StoreState::default()
        };

        let partitions = [
            (CampaignStatus::Pending, snapshot.pending),
            (CampaignStatus::Approved, snapshot.approved),
            (CampaignStatus::Rejected, snapshot.rejected),
            (CampaignStatus::Completed, snapshot.completed),
        ];
        for (partition, campaigns) in partitions {
            for campaign in campaigns {
                if campaign.status != partition {
                    return Err(AppError::Storage(format!(
                        "campaign {} is {} but stored in the {} partition",
                        campaign.id, campaign.status, partition
                    )));
                }
                let id = campaign.id;
                if state.campaigns.insert(id, campaign).is_some() {
                    return Err(AppError::Storage(format!(
                        "campaign {} appears in more than one partition",
                        id
                    )));
                }
            }
        }

        if let Some(max_id) = state.campaigns.keys().next_back() {
            state.next_id = state.next_id.max(max_id.0);
        }

        for (index, donation) in snapshot.donations.iter().enumerate() {
            if let Some(key) = &donation.idempotency_key {
                if state.idempotency.insert(key.clone(), index).is_some() {
                    return Err(AppError::Storage(format!(
                        "idempotency key '{}' recorded twice",
                        key
                    )));
                }
            }
        }
        state.donations = Arc::new(snapshot.donations);

        state.audit_raised_totals();
        Ok(state)
    }

    /// Logs any approved campaign whose total disagrees with its donations.
    fn audit_raised_totals(&self) {
        let mut sums: HashMap<CampaignId, BigDecimal> = HashMap::new();
        for donation in self.donations.iter() {
            let entry = sums
                .entry(donation.fundraiser_id)
                .or_insert_with(|| BigDecimal::from(0));
            *entry = &*entry + &donation.amount;
        }

        for campaign in self
            .campaigns
            .values()
            .filter(|c| c.status == CampaignStatus::Approved)
        {
            let recorded = sums
                .remove(&campaign.id)
                .unwrap_or_else(|| BigDecimal::from(0));
            if recorded != campaign.raised_amount {
                tracing::warn!(
                    campaign_id = %campaign.id,
                    raised = %campaign.raised_amount,
                    donations = %recorded,
                    "Raised total does not match donation history"
                );
            }
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            next_id: self.next_id,
            donations: self.donations.as_ref().clone(),
            ..Snapshot::default()
        };
        for campaign in self.campaigns.values() {
            let partition = match campaign.status {
                CampaignStatus::Pending => &mut snapshot.pending,
                CampaignStatus::Approved => &mut snapshot.approved,
                CampaignStatus::Rejected => &mut snapshot.rejected,
                CampaignStatus::Completed => &mut snapshot.completed,
            };
            partition.push(campaign.clone());
        }
        snapshot
    }

    fn push_donation(&mut self, donation: Donation) -> AppResult<()> {
        if let Some(key) = &donation.idempotency_key {
            if self.idempotency.contains_key(key) {
                return Err(AppError::InvalidInput(format!(
                    "idempotency_key: '{}' was already used",
                    key
                )));
            }
            self.idempotency.insert(key.clone(), self.donations.len());
        }
        Arc::make_mut(&mut self.donations).push(donation);
        Ok(())
    }

    fn pop_donation(&mut self) {
        if let Some(donation) = Arc::make_mut(&mut self.donations).pop() {
            if let Some(key) = donation.idempotency_key {
                self.idempotency.remove(&key);
            }
        }
    }
}

type LockMap = HashMap<CampaignId, Arc<Mutex<()>>>;

/// Exclusive hold on one campaign id. On release, every lock entry that
/// nobody holds or waits on any more leaves the map.
pub struct CampaignLock {
    locks: Arc<SyncMutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CampaignLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

pub struct CampaignStore {
    state: RwLock<StoreState>,
    backend: Arc<dyn SnapshotStore>,
    locks: Arc<SyncMutex<LockMap>>,
}

impl CampaignStore {
    /// Loads whatever the backend holds; an empty backend starts an empty store.
    pub async fn open(backend: Arc<dyn SnapshotStore>) -> AppResult<Self> {
        let state = match backend.load().await? {
            Some(snapshot) => StoreState::from_snapshot(snapshot)?,
            None => StoreState::default(),
        };

        tracing::info!(
            campaigns = state.campaigns.len(),
            donations = state.donations.len(),
            next_id = state.next_id,
            "Campaign store opened"
        );

        Ok(Self {
            state: RwLock::new(state),
            backend,
            locks: Arc::new(SyncMutex::new(HashMap::new())),
        })
    }

    /// Serializes read-modify-write sequences on one campaign.
    pub async fn lock_campaign(&self, id: CampaignId) -> CampaignLock {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        CampaignLock {
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub async fn get(&self, id: CampaignId) -> Option<Campaign> {
        self.state.read().await.campaigns.get(&id).cloned()
    }

    /// Matching campaigns in ascending id order.
    pub async fn list(&self, filter: &CampaignFilter) -> Vec<Campaign> {
        self.state
            .read()
            .await
            .campaigns
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    pub async fn put(&self, campaign: Campaign, mode: PutMode) -> AppResult<Campaign> {
        let mut state = self.state.write().await;
        let id = campaign.id;
        let exists = state.campaigns.contains_key(&id);
        match mode {
            PutMode::Update if !exists => return Err(AppError::NotFound(id)),
            PutMode::Insert if exists => {
                return Err(AppError::InvalidInput(format!(
                    "id: campaign {} already exists",
                    id
                )))
            }
            _ => {}
        }

        let previous = state.campaigns.insert(id, campaign.clone());
        let previous_next_id = state.next_id;
        state.next_id = state.next_id.max(id.0);

        if let Err(e) = self.flush(&state).await {
            match previous {
                Some(old) => state.campaigns.insert(id, old),
                None => state.campaigns.remove(&id),
            };
            state.next_id = previous_next_id;
            return Err(e);
        }

        Ok(campaign)
    }

    /// Assigns the next id (one past the highest ever used) and inserts the
    /// record `build` produces for it, in one step.
    pub async fn insert_new<F>(&self, build: F) -> AppResult<Campaign>
    where
        F: FnOnce(CampaignId) -> Campaign + Send,
    {
        let mut state = self.state.write().await;
        let previous_next_id = state.next_id;
        let in_use = state.campaigns.keys().next_back().map_or(0, |id| id.0);
        let id = CampaignId(previous_next_id.max(in_use) + 1);

        let mut campaign = build(id);
        campaign.id = id;
        state.campaigns.insert(id, campaign.clone());
        state.next_id = id.0;

        if let Err(e) = self.flush(&state).await {
            state.campaigns.remove(&id);
            state.next_id = previous_next_id;
            return Err(e);
        }

        Ok(campaign)
    }

    /// Donations that reference the removed record are kept.
    pub async fn remove(&self, id: CampaignId) -> AppResult<Option<Campaign>> {
        let mut state = self.state.write().await;
        let Some(removed) = state.campaigns.remove(&id) else {
            return Ok(None);
        };

        if let Err(e) = self.flush(&state).await {
            state.campaigns.insert(id, removed);
            return Err(e);
        }

        Ok(Some(removed))
    }

    /// Appends a donation record without touching any campaign total.
    pub async fn append_donation(&self, donation: Donation) -> AppResult<Donation> {
        check_donation(&donation)?;

        let mut state = self.state.write().await;
        state.push_donation(donation.clone())?;

        if let Err(e) = self.flush(&state).await {
            state.pop_donation();
            return Err(e);
        }

        Ok(donation)
    }

    /// Writes the credited campaign and its new donation as one change.
    pub async fn record_donation(
        &self,
        campaign: Campaign,
        donation: Donation,
    ) -> AppResult<(Campaign, Donation)> {
        check_donation(&donation)?;
        if donation.fundraiser_id != campaign.id {
            return Err(AppError::InvalidInput(format!(
                "fundraiser_id: donation targets {} but campaign is {}",
                donation.fundraiser_id, campaign.id
            )));
        }

        let mut state = self.state.write().await;
        let id = campaign.id;
        let Some(previous) = state.campaigns.insert(id, campaign.clone()) else {
            state.campaigns.remove(&id);
            return Err(AppError::NotFound(id));
        };
        if let Err(e) = state.push_donation(donation.clone()) {
            state.campaigns.insert(id, previous);
            return Err(e);
        }

        if let Err(e) = self.flush(&state).await {
            state.pop_donation();
            state.campaigns.insert(id, previous);
            return Err(e);
        }

        Ok((campaign, donation))
    }

    /// Point-in-time view of the whole donation history.
    pub async fn donations(&self) -> Arc<Vec<Donation>> {
        self.state.read().await.donations.clone()
    }

    pub async fn donation_by_key(&self, key: &str) -> Option<Donation> {
        let state = self.state.read().await;
        state
            .idempotency
            .get(key)
            .and_then(|index| state.donations.get(*index))
            .cloned()
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            campaigns: state.campaigns.len(),
            donations: state.donations.len(),
        }
    }

    async fn flush(&self, state: &StoreState) -> AppResult<()> {
        let snapshot = state.to_snapshot();
        self.backend.save(&snapshot).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to flush campaign store");
            e
        })
    }
}

fn check_donation(donation: &Donation) -> AppResult<()> {
    validate_positive_amount(&donation.amount)?;
    validate_donor_address(&donation.donor_address)?;
    if let Some(key) = &donation.idempotency_key {
        validate_idempotency_key(key)?;
    }
    Ok(())
}

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::{Campaign, CampaignDraft, CampaignId, Operation, UpdateDraft};
use crate::error::{AppError, AppResult};
use crate::store::{CampaignFilter, CampaignStore, PutMode};
use crate::validation::{sanitize_campaign_draft, sanitize_update_draft};

pub const DEFAULT_CAMPAIGN_WINDOW_DAYS: i64 = 60;

/// Drives campaigns through review. Every operation holds the campaign's
/// lock for its whole read-modify-write.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<CampaignStore>,
    campaign_window: Duration,
}

impl LifecycleManager {
    pub fn new(store: Arc<CampaignStore>) -> Self {
        Self::with_window(store, Duration::days(DEFAULT_CAMPAIGN_WINDOW_DAYS))
    }

    pub fn with_window(store: Arc<CampaignStore>, campaign_window: Duration) -> Self {
        Self {
            store,
            campaign_window,
        }
    }

    pub fn store(&self) -> &Arc<CampaignStore> {
        &self.store
    }

    pub async fn submit(&self, draft: CampaignDraft) -> AppResult<Campaign> {
        let draft = sanitize_campaign_draft(draft)?;
        let now = Utc::now();
        let campaign = self
            .store
            .insert_new(move |id| Campaign::new(id, draft, now))
            .await?;

        tracing::info!(
            campaign_id = %campaign.id,
            organization = %campaign.organization,
            goal = %campaign.goal_amount,
            "Campaign submitted for review"
        );
        Ok(campaign)
    }

    pub async fn approve(&self, id: CampaignId) -> AppResult<Campaign> {
        let window = self.campaign_window;
        let campaign = self
            .modify(id, Operation::Approve, |c| c.approve(Utc::now(), window))
            .await?;

        tracing::info!(campaign_id = %id, end_date = ?campaign.end_date, "Campaign approved");
        Ok(campaign)
    }

    pub async fn reject(&self, id: CampaignId, reason: &str) -> AppResult<Campaign> {
        let campaign = self
            .modify(id, Operation::Reject, |c| c.reject(reason, Utc::now()))
            .await?;

        tracing::info!(
            campaign_id = %id,
            reason = campaign.rejection_reason.as_deref().unwrap_or_default(),
            "Campaign rejected"
        );
        Ok(campaign)
    }

    pub async fn resubmit(&self, id: CampaignId) -> AppResult<Campaign> {
        let campaign = self
            .modify(id, Operation::Resubmit, |c| c.resubmit(Utc::now()))
            .await?;

        tracing::info!(campaign_id = %id, "Campaign resubmitted for review");
        Ok(campaign)
    }

    pub async fn post_update(&self, id: CampaignId, update: UpdateDraft) -> AppResult<Campaign> {
        let update = sanitize_update_draft(update)?;
        let campaign = self
            .modify(id, Operation::PostUpdate, |c| {
                c.post_update(update, Utc::now()).map(|_| ())
            })
            .await?;

        tracing::info!(
            campaign_id = %id,
            updates = campaign.updates.len(),
            "Progress update posted"
        );
        Ok(campaign)
    }

    /// Removes an approved campaign. Deleting an unknown id succeeds with
    /// `None`; donation history is left in place.
    pub async fn delete(&self, id: CampaignId) -> AppResult<Option<Campaign>> {
        let _guard = self.store.lock_campaign(id).await;
        let Some(campaign) = self.store.get(id).await else {
            tracing::debug!(campaign_id = %id, "Delete of unknown campaign ignored");
            return Ok(None);
        };

        if let Err(e) = campaign.ensure(Operation::Delete) {
            tracing::warn!(campaign_id = %id, error = %e, "Delete refused");
            return Err(e);
        }

        let removed = self.store.remove(id).await?;
        tracing::info!(campaign_id = %id, "Campaign deleted by auditor");
        Ok(removed)
    }

    pub async fn get(&self, id: CampaignId) -> AppResult<Campaign> {
        self.store.get(id).await.ok_or(AppError::NotFound(id))
    }

    pub async fn list(&self, filter: &CampaignFilter) -> Vec<Campaign> {
        self.store.list(filter).await
    }

    async fn modify<F>(&self, id: CampaignId, operation: Operation, apply: F) -> AppResult<Campaign>
    where
        F: FnOnce(&mut Campaign) -> AppResult<()>,
    {
        let _guard = self.store.lock_campaign(id).await;
        let mut campaign = self.store.get(id).await.ok_or(AppError::NotFound(id))?;

        if let Err(e) = apply(&mut campaign) {
            tracing::warn!(campaign_id = %id, %operation, error = %e, "Lifecycle operation refused");
            return Err(e);
        }

        self.store.put(campaign, PutMode::Update).await
    }
}

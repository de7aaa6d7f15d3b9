use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Campaign, CampaignId, CampaignStatus, Donation, Operation};
use crate::error::{AppError, AppResult};
use crate::store::{CampaignFilter, CampaignStore};
use crate::validation::{
    sanitize_string, validate_donor_address, validate_idempotency_key, validate_positive_amount,
};

/// Result of a recorded donation: the credited campaign and the new record.
#[derive(Debug, Clone, Serialize)]
pub struct DonationReceipt {
    pub campaign: Campaign,
    pub donation: Donation,
}

/// Donations for one campaign in the order they were recorded.
///
/// Holds a point-in-time view of the history; iterating twice yields the
/// same sequence.
#[derive(Debug, Clone)]
pub struct DonationHistory {
    fundraiser_id: CampaignId,
    donations: Arc<Vec<Donation>>,
}

impl DonationHistory {
    pub fn fundraiser_id(&self) -> CampaignId {
        self.fundraiser_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Donation> + '_ {
        let id = self.fundraiser_id;
        self.donations.iter().filter(move |d| d.fundraiser_id == id)
    }

    pub fn total(&self) -> BigDecimal {
        self.iter()
            .fold(BigDecimal::from(0), |acc, d| acc + &d.amount)
    }
}

impl<'a> IntoIterator for &'a DonationHistory {
    type Item = &'a Donation;
    type IntoIter = Box<dyn Iterator<Item = &'a Donation> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub completed: usize,
    pub total_raised: BigDecimal,
    pub donations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorSummary {
    pub donor_address: String,
    pub total_donated: BigDecimal,
    pub donation_count: usize,
    pub campaigns_supported: usize,
}

#[derive(Clone)]
pub struct DonationLedger {
    store: Arc<CampaignStore>,
}

impl DonationLedger {
    pub fn new(store: Arc<CampaignStore>) -> Self {
        Self { store }
    }

    pub async fn donate(
        &self,
        fundraiser_id: CampaignId,
        amount: BigDecimal,
        donor_address: &str,
    ) -> AppResult<DonationReceipt> {
        let _guard = self.store.lock_campaign(fundraiser_id).await;
        self.credit(fundraiser_id, amount, donor_address, None).await
    }

    /// Like `donate`, but a key seen before returns the donation it first
    /// recorded instead of recording a second one.
    pub async fn donate_idempotent(
        &self,
        idempotency_key: &str,
        fundraiser_id: CampaignId,
        amount: BigDecimal,
        donor_address: &str,
    ) -> AppResult<DonationReceipt> {
        let key = idempotency_key.trim();
        validate_idempotency_key(key)?;

        let _guard = self.store.lock_campaign(fundraiser_id).await;
        if let Some(donation) = self.store.donation_by_key(key).await {
            if donation.fundraiser_id != fundraiser_id {
                return Err(AppError::InvalidInput(format!(
                    "idempotency_key: '{}' was used for campaign {}",
                    key, donation.fundraiser_id
                )));
            }
            let campaign = self
                .store
                .get(fundraiser_id)
                .await
                .ok_or(AppError::NotFound(fundraiser_id))?;

            tracing::info!(
                campaign_id = %fundraiser_id,
                donation_id = %donation.id,
                "Replayed donation for repeated idempotency key"
            );
            return Ok(DonationReceipt { campaign, donation });
        }

        self.credit(fundraiser_id, amount, donor_address, Some(key.to_string()))
            .await
    }

    /// Caller holds the campaign lock.
    async fn credit(
        &self,
        fundraiser_id: CampaignId,
        amount: BigDecimal,
        donor_address: &str,
        idempotency_key: Option<String>,
    ) -> AppResult<DonationReceipt> {
        let mut campaign = self
            .store
            .get(fundraiser_id)
            .await
            .ok_or(AppError::NotFound(fundraiser_id))?;

        if let Err(e) = campaign.ensure(Operation::Donate) {
            tracing::warn!(campaign_id = %fundraiser_id, error = %e, "Donation refused");
            return Err(e);
        }

        let donor_address = sanitize_string(donor_address);
        validate_positive_amount(&amount)?;
        validate_donor_address(&donor_address)?;

        campaign.credit(&amount)?;
        let donation = Donation::new(fundraiser_id, amount, donor_address, idempotency_key);
        let (campaign, donation) = self.store.record_donation(campaign, donation).await?;

        tracing::info!(
            campaign_id = %fundraiser_id,
            donation_id = %donation.id,
            amount = %donation.amount,
            raised = %campaign.raised_amount,
            "Donation recorded"
        );
        Ok(DonationReceipt { campaign, donation })
    }

    /// History survives deletion of the campaign it references.
    pub async fn history(&self, fundraiser_id: CampaignId) -> DonationHistory {
        DonationHistory {
            fundraiser_id,
            donations: self.store.donations().await,
        }
    }

    /// Approved campaigns, most recently verified first.
    pub async fn recently_approved(&self, limit: usize) -> Vec<Campaign> {
        let mut approved = self
            .store
            .list(&CampaignFilter::status(CampaignStatus::Approved))
            .await;
        approved.sort_by(|a, b| {
            b.verification_date
                .cmp(&a.verification_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        approved.truncate(limit);
        approved
    }

    pub async fn summary(&self) -> CampaignSummary {
        let campaigns = self.store.list(&CampaignFilter::all()).await;
        let count = |status: CampaignStatus| campaigns.iter().filter(|c| c.status == status).count();

        let total_raised = campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Approved)
            .fold(BigDecimal::from(0), |acc, c| acc + &c.raised_amount);

        CampaignSummary {
            pending: count(CampaignStatus::Pending),
            approved: count(CampaignStatus::Approved),
            rejected: count(CampaignStatus::Rejected),
            completed: count(CampaignStatus::Completed),
            total_raised,
            donations: self.store.stats().await.donations,
        }
    }

    pub async fn donor_summary(&self, donor_address: &str) -> DonorSummary {
        let donor_address = sanitize_string(donor_address);
        let donations = self.store.donations().await;

        let mut total_donated = BigDecimal::from(0);
        let mut donation_count = 0;
        let mut campaigns = HashSet::new();
        for donation in donations.iter().filter(|d| d.donor_address == donor_address) {
            total_donated = total_donated + &donation.amount;
            donation_count += 1;
            campaigns.insert(donation.fundraiser_id);
        }

        DonorSummary {
            donor_address,
            total_donated,
            donation_count,
            campaigns_supported: campaigns.len(),
        }
    }
}

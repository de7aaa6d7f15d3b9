//! Donation domain entity.
//! An asserted transfer toward an approved campaign. Immutable once recorded.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::campaign::CampaignId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub fundraiser_id: CampaignId,
    pub amount: BigDecimal,
    pub donor_address: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl Donation {
    pub fn new(
        fundraiser_id: CampaignId,
        amount: BigDecimal,
        donor_address: String,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fundraiser_id,
            amount,
            donor_address,
            timestamp: Utc::now(),
            idempotency_key,
        }
    }
}

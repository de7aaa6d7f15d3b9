//! Campaign domain entity.
//! A fundraising campaign and the field changes each lifecycle step makes.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::status::{transition, CampaignStatus, Operation, Outcome};
use crate::error::AppError;

pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub u64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CampaignId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CampaignId)
    }
}

impl From<u64> for CampaignId {
    fn from(value: u64) -> Self {
        CampaignId(value)
    }
}

/// Supporting document attached at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u32,
    pub title: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Text,
    Milestone,
    Image,
}

/// Progress entry posted by the organization while the campaign runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub id: u32,
    pub kind: UpdateKind,
    pub content: String,
    pub image_url: Option<String>,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    pub reference: String,
}

/// What an organization submits for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDraft {
    pub title: String,
    pub organization: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub goal_amount: BigDecimal,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDraft {
    pub kind: UpdateKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    pub organization: String,
    pub description: String,
    pub category: String,
    pub wallet_address: Option<String>,
    pub goal_amount: BigDecimal,
    pub raised_amount: BigDecimal,
    pub status: CampaignStatus,
    pub is_verified: bool,
    pub documents: Vec<Document>,
    pub updates: Vec<ProgressUpdate>,
    pub submission_date: DateTime<Utc>,
    pub verification_date: Option<DateTime<Utc>>,
    pub rejection_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Builds a pending, unverified campaign from an already validated draft.
    pub fn new(id: CampaignId, draft: CampaignDraft, now: DateTime<Utc>) -> Self {
        let documents = draft
            .documents
            .into_iter()
            .enumerate()
            .map(|(index, doc)| Document {
                id: index as u32 + 1,
                title: doc.title,
                reference: doc.reference,
            })
            .collect();

        Self {
            id,
            title: draft.title,
            organization: draft.organization,
            description: draft.description,
            category: draft.category,
            wallet_address: draft.wallet_address,
            goal_amount: draft.goal_amount,
            raised_amount: BigDecimal::from(0),
            status: CampaignStatus::Pending,
            is_verified: false,
            documents,
            updates: Vec::new(),
            submission_date: now,
            verification_date: None,
            rejection_date: None,
            rejection_reason: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Fails with `InvalidTransition` unless the table allows `operation`
    /// from the current status.
    pub fn ensure(&self, operation: Operation) -> Result<Outcome, AppError> {
        transition(self.status, operation).ok_or(AppError::InvalidTransition {
            id: self.id,
            status: self.status,
            operation,
        })
    }

    /// Moves to the status the table names for `operation`. Removal is the
    /// store's job, so `Outcome::Removed` leaves the record as it is.
    fn advance(&mut self, operation: Operation) -> Result<(), AppError> {
        if let Outcome::Stays(next) = self.ensure(operation)? {
            self.status = next;
        }
        Ok(())
    }

    pub fn approve(&mut self, now: DateTime<Utc>, window: Duration) -> Result<(), AppError> {
        self.ensure(Operation::Approve)?;
        let end_date = now.checked_add_signed(window).ok_or_else(|| {
            AppError::Config(format!(
                "campaign window of {} days runs past the supported calendar",
                window.num_days()
            ))
        })?;

        self.advance(Operation::Approve)?;
        self.is_verified = true;
        self.raised_amount = BigDecimal::from(0);
        self.verification_date = Some(now);
        self.start_date = Some(now);
        self.end_date = Some(end_date);
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        self.advance(Operation::Reject)?;
        let reason = reason.trim();
        self.rejection_reason = Some(if reason.is_empty() {
            DEFAULT_REJECTION_REASON.to_string()
        } else {
            reason.to_string()
        });
        self.rejection_date = Some(now);
        Ok(())
    }

    /// Raised total and verification flag are left as they were.
    pub fn resubmit(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.advance(Operation::Resubmit)?;
        self.rejection_reason = None;
        self.submission_date = now;
        Ok(())
    }

    pub fn post_update(
        &mut self,
        draft: UpdateDraft,
        now: DateTime<Utc>,
    ) -> Result<&ProgressUpdate, AppError> {
        self.advance(Operation::PostUpdate)?;
        let next_id = self.updates.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        self.updates.push(ProgressUpdate {
            id: next_id,
            kind: draft.kind,
            content: draft.content,
            image_url: draft.image_url,
            posted_at: now,
        });
        let posted = self.updates.len() - 1;
        Ok(&self.updates[posted])
    }

    pub fn credit(&mut self, amount: &BigDecimal) -> Result<(), AppError> {
        self.advance(Operation::Donate)?;
        self.raised_amount = &self.raised_amount + amount;
        Ok(())
    }
}

//! Campaign status set and the transition table that governs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Approved,
    Rejected,
    /// Reached only through an external time/goal trigger.
    Completed,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 4] = [
        CampaignStatus::Pending,
        CampaignStatus::Approved,
        CampaignStatus::Rejected,
        CampaignStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Approved => "approved",
            CampaignStatus::Rejected => "rejected",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(CampaignStatus::Pending),
            "approved" => Ok(CampaignStatus::Approved),
            "rejected" => Ok(CampaignStatus::Rejected),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(format!("unknown campaign status '{}'", other)),
        }
    }
}

/// Operations that are only legal from a particular status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Approve,
    Reject,
    Resubmit,
    PostUpdate,
    Donate,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Approve => "approve",
            Operation::Reject => "reject",
            Operation::Resubmit => "resubmit",
            Operation::PostUpdate => "post an update to",
            Operation::Donate => "donate to",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Where a legal operation leaves the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Stays(CampaignStatus),
    Removed,
}

const TRANSITIONS: [(Operation, CampaignStatus, Outcome); 6] = [
    (
        Operation::Approve,
        CampaignStatus::Pending,
        Outcome::Stays(CampaignStatus::Approved),
    ),
    (
        Operation::Reject,
        CampaignStatus::Pending,
        Outcome::Stays(CampaignStatus::Rejected),
    ),
    (
        Operation::Resubmit,
        CampaignStatus::Rejected,
        Outcome::Stays(CampaignStatus::Pending),
    ),
    (
        Operation::PostUpdate,
        CampaignStatus::Approved,
        Outcome::Stays(CampaignStatus::Approved),
    ),
    (
        Operation::Donate,
        CampaignStatus::Approved,
        Outcome::Stays(CampaignStatus::Approved),
    ),
    (Operation::Delete, CampaignStatus::Approved, Outcome::Removed),
];

/// Looks up `operation` applied to a record in `from`. `None` means the
/// table has no such edge and the operation must be refused.
pub fn transition(from: CampaignStatus, operation: Operation) -> Option<Outcome> {
    TRANSITIONS
        .iter()
        .find(|(op, source, _)| *op == operation && *source == from)
        .map(|(_, _, outcome)| *outcome)
}

pub mod ledger;
pub mod lifecycle;

pub use ledger::{CampaignSummary, DonationHistory, DonationLedger, DonationReceipt, DonorSummary};
pub use lifecycle::{LifecycleManager, DEFAULT_CAMPAIGN_WINDOW_DAYS};

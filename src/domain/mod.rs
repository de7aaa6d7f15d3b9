pub mod campaign;
pub mod donation;
pub mod status;

pub use campaign::{
    Campaign, CampaignDraft, CampaignId, Document, DocumentDraft, ProgressUpdate, UpdateDraft,
    UpdateKind,
};
pub use donation::Donation;
pub use status::{CampaignStatus, Operation, Outcome};

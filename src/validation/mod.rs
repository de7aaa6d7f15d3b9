use bigdecimal::BigDecimal;
use std::fmt;

use crate::domain::{CampaignDraft, UpdateDraft, UpdateKind};

pub const TITLE_MAX_LEN: usize = 120;
pub const ORGANIZATION_MAX_LEN: usize = 120;
pub const CATEGORY_MAX_LEN: usize = 40;
pub const DESCRIPTION_MAX_LEN: usize = 5000;
pub const DONOR_ADDRESS_MAX_LEN: usize = 128;
pub const REFERENCE_MAX_LEN: usize = 512;
pub const UPDATE_CONTENT_MAX_LEN: usize = 2000;
pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 255;
pub const AMOUNT_MAX_INTEGER_DIGITS: i64 = 20;
pub const AMOUNT_MAX_SCALE: i64 = 18;
// 10^38 needs 127 bits.
const AMOUNT_MAX_BITS: u64 = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Drops control characters and collapses runs of whitespace.
pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Caps magnitude and precision. Checked before any arithmetic, since
/// comparing or adding rescales both operands to a common exponent.
pub fn validate_amount_bounds(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    let (unscaled, scale) = amount.as_bigint_and_exponent();
    if unscaled.bits() > AMOUNT_MAX_BITS {
        return Err(ValidationError::new(field, "has too many digits"));
    }
    if scale > AMOUNT_MAX_SCALE {
        return Err(ValidationError::new(
            field,
            format!("must have at most {} decimal places", AMOUNT_MAX_SCALE),
        ));
    }
    if amount.digits() as i64 - scale > AMOUNT_MAX_INTEGER_DIGITS {
        return Err(ValidationError::new(
            field,
            format!("must have at most {} integer digits", AMOUNT_MAX_INTEGER_DIGITS),
        ));
    }

    Ok(())
}

pub fn validate_positive(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    validate_amount_bounds(field, amount)?;
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    validate_positive("amount", amount)
}

pub fn validate_donor_address(donor_address: &str) -> ValidationResult {
    validate_required("donor_address", donor_address)?;
    validate_max_len("donor_address", donor_address, DONOR_ADDRESS_MAX_LEN)
}

pub fn validate_idempotency_key(key: &str) -> ValidationResult {
    validate_required("idempotency_key", key)?;
    validate_max_len("idempotency_key", key, IDEMPOTENCY_KEY_MAX_LEN)
}

/// Normalizes the free-text fields of a draft and checks it.
pub fn sanitize_campaign_draft(mut draft: CampaignDraft) -> Result<CampaignDraft, ValidationError> {
    draft.title = sanitize_string(&draft.title);
    draft.organization = sanitize_string(&draft.organization);
    draft.category = sanitize_string(&draft.category).to_lowercase();
    draft.description = draft.description.trim().to_string();
    draft.wallet_address = draft
        .wallet_address
        .map(|addr| sanitize_string(&addr))
        .filter(|addr| !addr.is_empty());

    validate_required("title", &draft.title)?;
    validate_max_len("title", &draft.title, TITLE_MAX_LEN)?;
    validate_required("organization", &draft.organization)?;
    validate_max_len("organization", &draft.organization, ORGANIZATION_MAX_LEN)?;
    validate_max_len("category", &draft.category, CATEGORY_MAX_LEN)?;
    validate_max_len("description", &draft.description, DESCRIPTION_MAX_LEN)?;
    validate_positive("goal_amount", &draft.goal_amount)?;

    for doc in draft.documents.iter_mut() {
        doc.title = sanitize_string(&doc.title);
        doc.reference = doc.reference.trim().to_string();
        validate_required("documents.title", &doc.title)?;
        validate_max_len("documents.reference", &doc.reference, REFERENCE_MAX_LEN)?;
    }

    Ok(draft)
}

pub fn sanitize_update_draft(mut draft: UpdateDraft) -> Result<UpdateDraft, ValidationError> {
    draft.content = draft.content.trim().to_string();
    draft.image_url = draft
        .image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    validate_max_len("content", &draft.content, UPDATE_CONTENT_MAX_LEN)?;
    match draft.kind {
        UpdateKind::Image => {
            let url = draft
                .image_url
                .as_deref()
                .ok_or_else(|| ValidationError::new("image_url", "required for image updates"))?;
            validate_max_len("image_url", url, REFERENCE_MAX_LEN)?;
        }
        UpdateKind::Text | UpdateKind::Milestone => {
            validate_required("content", &draft.content)?;
            draft.image_url = None;
        }
    }

    Ok(draft)
}

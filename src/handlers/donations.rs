use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CampaignId, Donation};
use crate::error::AppError;
use crate::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[derive(Debug, Deserialize, Serialize)]
pub struct DonationRequest {
    pub amount: BigDecimal,
    pub donor_address: String,
}

pub async fn donate(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(request): Json<DonationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::InvalidInput("idempotency_key: must be ASCII".to_string()))
        })
        .transpose()?;

    let receipt = match key {
        Some(key) => {
            state
                .ledger
                .donate_idempotent(key, CampaignId(id), request.amount, &request.donor_address)
                .await?
        }
        None => {
            state
                .ledger
                .donate(CampaignId(id), request.amount, &request.donor_address)
                .await?
        }
    };

    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn donation_history(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.ledger.history(CampaignId(id)).await;
    let donations: Vec<Donation> = history.iter().cloned().collect();
    Ok(Json(donations))
}

pub async fn summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.summary().await)
}

pub async fn donor_summary(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    Json(state.ledger.donor_summary(&address).await)
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::domain::{CampaignDraft, CampaignId, CampaignStatus, UpdateDraft};
use crate::error::AppError;
use crate::store::CampaignFilter;
use crate::AppState;

const DEFAULT_RECENT_LIMIT: usize = 10;
const MAX_RECENT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut filter = CampaignFilter::all();
    if let Some(status) = query.status.filter(|s| !s.trim().is_empty()) {
        filter.status = Some(status.parse::<CampaignStatus>().map_err(AppError::InvalidInput)?);
    }
    filter.category = query.category.filter(|c| !c.trim().is_empty());

    Ok(Json(state.lifecycle.list(&filter).await))
}

pub async fn submit_campaign(
    State(state): State<AppState>,
    Json(draft): Json<CampaignDraft>,
) -> Result<impl IntoResponse, AppError> {
    let campaign = state.lifecycle.submit(draft).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.lifecycle.get(CampaignId(id)).await?))
}

pub async fn approve_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.lifecycle.approve(CampaignId(id)).await?))
}

pub async fn reject_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Option<Json<RejectRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let reason = payload.map(|Json(request)| request.reason).unwrap_or_default();
    Ok(Json(state.lifecycle.reject(CampaignId(id), &reason).await?))
}

pub async fn resubmit_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.lifecycle.resubmit(CampaignId(id)).await?))
}

pub async fn post_update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<UpdateDraft>,
) -> Result<impl IntoResponse, AppError> {
    let campaign = state.lifecycle.post_update(CampaignId(id), update).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// 204 whether or not the campaign existed.
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    state.lifecycle.delete(CampaignId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recently_approved(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    Ok(Json(state.ledger.recently_approved(limit).await))
}

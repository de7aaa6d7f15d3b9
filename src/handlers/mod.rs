pub mod campaigns;
pub mod donations;

use crate::AppState;
use crate::store::StoreStats;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub store: StoreStats,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.lifecycle.store().stats().await;

    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store,
    })
}

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod store;
pub mod validation;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::services::{DonationLedger, LifecycleManager};
use crate::store::CampaignStore;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleManager,
    pub ledger: DonationLedger,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<CampaignStore>, config: &Config) -> Self {
        Self {
            lifecycle: LifecycleManager::with_window(store.clone(), config.campaign_window()),
            ledger: DonationLedger::new(store),
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/summary", get(handlers::donations::summary))
        .route(
            "/campaigns",
            get(handlers::campaigns::list_campaigns).post(handlers::campaigns::submit_campaign),
        )
        .route(
            "/campaigns/recently-approved",
            get(handlers::campaigns::recently_approved),
        )
        .route(
            "/campaigns/:id",
            get(handlers::campaigns::get_campaign).delete(handlers::campaigns::delete_campaign),
        )
        .route("/campaigns/:id/approve", post(handlers::campaigns::approve_campaign))
        .route("/campaigns/:id/reject", post(handlers::campaigns::reject_campaign))
        .route("/campaigns/:id/resubmit", post(handlers::campaigns::resubmit_campaign))
        .route("/campaigns/:id/updates", post(handlers::campaigns::post_update))
        .route(
            "/campaigns/:id/donations",
            get(handlers::donations::donation_history).post(handlers::donations::donate),
        )
        .route(
            "/donors/:address/summary",
            get(handlers::donations::donor_summary),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .with_state(state)
}

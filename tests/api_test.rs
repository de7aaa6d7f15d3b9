use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fundraiser_ledger::adapters::MemorySnapshotStore;
use fundraiser_ledger::config::Config;
use fundraiser_ledger::store::CampaignStore;
use fundraiser_ledger::{create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_app() -> Router {
    let backend = Arc::new(MemorySnapshotStore::new());
    let store = Arc::new(CampaignStore::open(backend).await.unwrap());
    create_app(AppState::new(store, &Config::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn campaign_body(goal: &str) -> Value {
    json!({
        "title": "Clean Water Initiative",
        "organization": "WaterAid Foundation",
        "description": "Wells for rural communities",
        "category": "Environment",
        "goal_amount": goal,
    })
}

#[tokio::test]
async fn test_health_reports_store_counts() {
    let app = setup_test_app().await;
    send(&app, "POST", "/campaigns", Some(campaign_body("5"))).await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["campaigns"], 1);
    assert_eq!(body["store"]["donations"], 0);
}

#[tokio::test]
async fn test_campaign_review_flow() {
    let app = setup_test_app().await;

    let (status, created) = send(&app, "POST", "/campaigns", Some(campaign_body("5"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["category"], "environment");

    let (status, approved) = send(&app, "POST", "/campaigns/1/approve", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["is_verified"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/campaigns/1/reject",
        Some(json!({ "reason": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (status, listed) = send(&app, "GET", "/campaigns?status=approved", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, listed) = send(&app, "GET", "/campaigns?status=pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reject_without_body_uses_default_reason() {
    let app = setup_test_app().await;
    send(&app, "POST", "/campaigns", Some(campaign_body("3"))).await;

    let (status, rejected) = send(&app, "POST", "/campaigns/1/reject", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["rejection_reason"], "No reason provided");

    let (status, resubmitted) = send(&app, "POST", "/campaigns/1/resubmit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resubmitted["status"], "pending");
    assert_eq!(resubmitted["rejection_reason"], Value::Null);
}

#[tokio::test]
async fn test_donation_endpoints() {
    let app = setup_test_app().await;
    send(&app, "POST", "/campaigns", Some(campaign_body("5"))).await;
    send(&app, "POST", "/campaigns/1/approve", None).await;

    let donation = json!({ "amount": "2.5", "donor_address": "0xabc" });
    let (status, receipt) = send(&app, "POST", "/campaigns/1/donations", Some(donation.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["campaign"]["raised_amount"], "2.5");
    assert_eq!(receipt["donation"]["donor_address"], "0xabc");

    let (status, _) = send_with_headers(
        &app,
        "POST",
        "/campaigns/1/donations",
        Some(donation.clone()),
        &[("idempotency-key", "cart-9")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, replay) = send_with_headers(
        &app,
        "POST",
        "/campaigns/1/donations",
        Some(donation),
        &[("idempotency-key", "cart-9")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(replay["campaign"]["raised_amount"], "5.0");

    let (status, history) = send(&app, "GET", "/campaigns/1/donations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);

    let (status, summary) = send(&app, "GET", "/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["approved"], 1);
    assert_eq!(summary["donations"], 2);

    let (status, donor) = send(&app, "GET", "/donors/0xabc/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(donor["donation_count"], 2);
}

#[tokio::test]
async fn test_donation_error_statuses() {
    let app = setup_test_app().await;
    send(&app, "POST", "/campaigns", Some(campaign_body("5"))).await;

    let donation = json!({ "amount": "1.0", "donor_address": "0xabc" });
    let (status, body) = send(&app, "POST", "/campaigns/999/donations", Some(donation.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Campaign 999 not found");

    let (status, _) = send(&app, "POST", "/campaigns/1/donations", Some(donation)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "POST", "/campaigns/1/approve", None).await;
    let negative = json!({ "amount": "-1.0", "donor_address": "0xabc" });
    let (status, _) = send(&app, "POST", "/campaigns/1/donations", Some(negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let huge = json!({ "amount": "1e4000000", "donor_address": "0xabc" });
    let (status, body) = send(&app, "POST", "/campaigns/1/donations", Some(huge)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (_, campaign) = send(&app, "GET", "/campaigns/1", None).await;
    assert_eq!(campaign["raised_amount"], "0");
}

#[tokio::test]
async fn test_invalid_submission_is_bad_request() {
    let app = setup_test_app().await;

    let (status, body) = send(&app, "POST", "/campaigns", Some(campaign_body("0"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = send(&app, "GET", "/campaigns?status=archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_twice_is_no_content() {
    let app = setup_test_app().await;
    send(&app, "POST", "/campaigns", Some(campaign_body("5"))).await;

    let (status, _) = send(&app, "DELETE", "/campaigns/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "POST", "/campaigns/1/approve", None).await;
    let (status, _) = send(&app, "DELETE", "/campaigns/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", "/campaigns/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/campaigns/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recently_approved_route() {
    let app = setup_test_app().await;
    for _ in 0..3 {
        send(&app, "POST", "/campaigns", Some(campaign_body("5"))).await;
    }
    send(&app, "POST", "/campaigns/1/approve", None).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    send(&app, "POST", "/campaigns/3/approve", None).await;

    let (status, recent) = send(&app, "GET", "/campaigns/recently-approved?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["id"], 3);
}

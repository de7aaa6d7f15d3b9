use bigdecimal::BigDecimal;
use fundraiser_ledger::adapters::JsonFileSnapshotStore;
use fundraiser_ledger::domain::{
    CampaignDraft, CampaignId, CampaignStatus, DocumentDraft, UpdateDraft, UpdateKind,
};
use fundraiser_ledger::services::{DonationLedger, LifecycleManager};
use fundraiser_ledger::store::{CampaignFilter, CampaignStore};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

async fn open(path: &Path) -> (LifecycleManager, DonationLedger) {
    let backend = Arc::new(JsonFileSnapshotStore::new(path));
    let store = Arc::new(CampaignStore::open(backend).await.unwrap());
    (
        LifecycleManager::new(store.clone()),
        DonationLedger::new(store),
    )
}

fn draft(title: &str) -> CampaignDraft {
    CampaignDraft {
        title: title.to_string(),
        organization: "Harbor Food Bank".to_string(),
        description: "Winter meal packs".to_string(),
        category: "food".to_string(),
        goal_amount: BigDecimal::from(1200),
        wallet_address: Some("0x9f2c".to_string()),
        documents: vec![DocumentDraft {
            title: "Registration certificate".to_string(),
            reference: "docs/registration.pdf".to_string(),
        }],
    }
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("campaigns.json");

    let (campaigns_before, donations_before) = {
        let (lifecycle, ledger) = open(&path).await;
        let approved = lifecycle.submit(draft("Meal packs")).await.unwrap();
        lifecycle.approve(approved.id).await.unwrap();
        lifecycle
            .post_update(
                approved.id,
                UpdateDraft {
                    kind: UpdateKind::Image,
                    content: String::new(),
                    image_url: Some("https://cdn.example.org/packs.jpg".to_string()),
                },
            )
            .await
            .unwrap();
        ledger
            .donate_idempotent(
                "order-77",
                approved.id,
                BigDecimal::from_str("12.345").unwrap(),
                "0xabc",
            )
            .await
            .unwrap();

        let rejected = lifecycle.submit(draft("Blankets")).await.unwrap();
        lifecycle.reject(rejected.id, "unverified bank").await.unwrap();
        lifecycle.submit(draft("Heaters")).await.unwrap();

        let donations: Vec<_> = ledger.history(approved.id).await.iter().cloned().collect();
        (lifecycle.list(&CampaignFilter::all()).await, donations)
    };

    assert!(path.exists());

    let (lifecycle, ledger) = open(&path).await;
    assert_eq!(lifecycle.list(&CampaignFilter::all()).await, campaigns_before);

    let donations_after: Vec<_> = ledger.history(CampaignId(1)).await.iter().cloned().collect();
    assert_eq!(donations_after, donations_before);
    assert_eq!(
        donations_after[0].idempotency_key.as_deref(),
        Some("order-77")
    );

    let replay = ledger
        .donate_idempotent("order-77", CampaignId(1), BigDecimal::from(1), "0xabc")
        .await
        .unwrap();
    assert_eq!(replay.donation.id, donations_before[0].id);
}

#[tokio::test]
async fn test_ids_not_reused_after_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campaigns.json");

    {
        let (lifecycle, _) = open(&path).await;
        lifecycle.submit(draft("One")).await.unwrap();
        let second = lifecycle.submit(draft("Two")).await.unwrap();
        lifecycle.approve(second.id).await.unwrap();
        lifecycle.delete(second.id).await.unwrap();
    }

    let (lifecycle, _) = open(&path).await;
    let third = lifecycle.submit(draft("Three")).await.unwrap();
    assert_eq!(third.id, CampaignId(3));
}

#[tokio::test]
async fn test_snapshot_partitions_follow_status() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campaigns.json");

    let (lifecycle, _) = open(&path).await;
    let a = lifecycle.submit(draft("A")).await.unwrap();
    let b = lifecycle.submit(draft("B")).await.unwrap();
    lifecycle.approve(a.id).await.unwrap();
    lifecycle.reject(b.id, "").await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["approved"].as_array().unwrap().len(), 1);
    assert_eq!(raw["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(raw["pending"].as_array().unwrap().len(), 0);
    assert_eq!(raw["approved"][0]["status"], "approved");
    assert_eq!(raw["next_id"], 2);

    let status = |v: &serde_json::Value| v["status"].as_str().unwrap().to_string();
    assert_eq!(status(&raw["rejected"][0]), CampaignStatus::Rejected.to_string());
}

#[tokio::test]
async fn test_misfiled_snapshot_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campaigns.json");

    {
        let (lifecycle, _) = open(&path).await;
        lifecycle.submit(draft("A")).await.unwrap();
    }

    let mut raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let pending = raw["pending"].take();
    raw["approved"] = pending;
    raw["pending"] = serde_json::json!([]);
    std::fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    let backend = Arc::new(JsonFileSnapshotStore::new(&path));
    assert!(CampaignStore::open(backend).await.is_err());
}

#[tokio::test]
async fn test_corrupt_file_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campaigns.json");
    std::fs::write(&path, "{ not json").unwrap();

    let backend = Arc::new(JsonFileSnapshotStore::new(&path));
    assert!(CampaignStore::open(backend).await.is_err());
}

// tests/seed_backfill.rs
use dispatch_watch::feed::OpenDataFeed;
use dispatch_watch::store::{IncidentStore, MemoryStore};
use dispatch_watch::watch::seed;

#[tokio::test]
async fn seed_backfills_an_empty_ledger_without_publishing() {
    let payload: &str = include_str!("fixtures/incidents.json");
    let feed = OpenDataFeed::from_fixture(payload);
    let store = MemoryStore::new();

    let rows = seed(&feed, &store).await.unwrap();
    assert_eq!(rows, 3);

    let history = store.read_history().await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn seed_refuses_a_ledger_that_already_has_rows() {
    let payload: &str = include_str!("fixtures/incidents.json");
    let feed = OpenDataFeed::from_fixture(payload);
    let store = MemoryStore::new();

    seed(&feed, &store).await.unwrap();
    let err = seed(&feed, &store).await.unwrap_err();
    assert!(err.to_string().contains("refusing to seed"));
    assert_eq!(store.rows().len(), 3);
}

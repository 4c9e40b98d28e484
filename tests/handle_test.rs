mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{seed_largest_entries, split_entry, MAX_ENTRIES_THAT_FIT, USER};
use sparkledger::application::{AppError, LedgerHandle, LedgerService};
use sparkledger::auth::StaticSession;
use sparkledger::domain::{running_total, ValidationError, MAX_AMOUNT_CENTS};
use sparkledger::storage::MemoryStore;

fn spawn_ledger() -> (LedgerHandle, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let handle = LedgerHandle::spawn(LedgerService::new(store.clone()));
    (handle, store)
}

#[tokio::test]
async fn test_handle_requires_binding() -> Result<()> {
    let (ledger, _store) = spawn_ledger();

    assert!(matches!(ledger.refresh().await, Err(AppError::NotBound)));
    assert!(matches!(
        ledger
            .add_entry(split_entry("Coffee", "2025-03-01", 450, 0, 450, 0))
            .await,
        Err(AppError::NotBound)
    ));
    assert!(ledger.snapshot().entries.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_snapshot_reflects_completed_commands() -> Result<()> {
    let (ledger, _store) = spawn_ledger();
    ledger.bind_authenticated(&StaticSession::signed_in(USER)).await?;

    let groceries = ledger
        .add_entry(split_entry("Groceries", "2025-03-01", 10000, 2000, 7000, 1000))
        .await?;
    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.summary.total_cents, 10000);

    let bad = ledger
        .add_entry(split_entry("Bad", "2025-03-02", 5000, 1000, 1000, 1000))
        .await;
    assert!(matches!(
        bad,
        Err(AppError::Validation(ValidationError::AllocationMismatch { .. }))
    ));
    assert_eq!(ledger.snapshot(), snapshot);

    ledger.delete_entry(groceries.id).await?;
    let snapshot = ledger.snapshot();
    assert!(snapshot.entries.is_empty());
    assert_eq!(snapshot.summary.total_cents, 0);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_callers_are_serialized() -> Result<()> {
    let (ledger, _store) = spawn_ledger();
    ledger.bind_user(USER).await?;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let ledger = ledger.clone();
        tasks.push(tokio::spawn(async move {
            let total = 100 + i;
            ledger
                .add_entry(split_entry("Tick", "2025-03-01", total, 0, total, 0))
                .await
        }));
    }
    for task in tasks {
        task.await??;
    }

    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.entries.len(), 20);
    assert_eq!(running_total(&snapshot.entries), Some(snapshot.summary.total_cents));
    assert_eq!(snapshot.summary.total_cents, (100..120).sum::<i64>());

    ledger.refresh().await?;
    assert_eq!(ledger.snapshot().summary.total_cents, (100..120).sum::<i64>());

    Ok(())
}

#[tokio::test]
async fn test_observer_sees_consistent_snapshots() -> Result<()> {
    let (ledger, _store) = spawn_ledger();
    ledger.bind_user(USER).await?;
    let mut updates = ledger.subscribe();

    let writer = {
        let ledger = ledger.clone();
        tokio::spawn(async move {
            for i in 1..=10 {
                ledger
                    .add_entry(split_entry("Tick", "2025-03-01", i * 10, 0, i * 10, 0))
                    .await?;
            }
            Ok::<_, AppError>(())
        })
    };

    let mut seen = 0;
    while seen < 10 {
        updates.changed().await?;
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(running_total(&snapshot.entries), Some(snapshot.summary.total_cents));
        assert_eq!(snapshot.summary.entry_count, snapshot.entries.len());
        seen = snapshot.entries.len();
    }
    writer.await??;

    Ok(())
}

#[tokio::test]
async fn test_store_failure_through_handle_keeps_snapshot() -> Result<()> {
    let (ledger, store) = spawn_ledger();
    ledger.bind_user(USER).await?;
    ledger
        .add_entry(split_entry("Coffee", "2025-03-01", 450, 0, 450, 0))
        .await?;
    let before = ledger.snapshot();

    store.set_offline(true);
    assert!(matches!(
        ledger
            .add_entry(split_entry("Lunch", "2025-03-02", 1200, 0, 1200, 0))
            .await,
        Err(AppError::Store(_))
    ));
    assert!(matches!(ledger.refresh().await, Err(AppError::Store(_))));
    assert_eq!(ledger.snapshot(), before);

    Ok(())
}

#[tokio::test]
async fn test_handle_binding_is_one_way() -> Result<()> {
    let (ledger, _store) = spawn_ledger();
    ledger.bind_user(USER).await?;
    assert!(matches!(
        ledger.bind_user("other").await,
        Err(AppError::AlreadyBound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_rejected_amounts_keep_the_task_running() -> Result<()> {
    let (ledger, store) = spawn_ledger();
    ledger.bind_user(USER).await?;

    assert!(matches!(
        ledger
            .add_entry(split_entry("Huge", "2025-03-01", i64::MAX, 0, i64::MAX, 0))
            .await,
        Err(AppError::Validation(ValidationError::AmountOutOfRange(..)))
    ));

    seed_largest_entries(&store, MAX_ENTRIES_THAT_FIT).await?;
    ledger.refresh().await?;
    let full = ledger.snapshot();

    assert!(matches!(
        ledger
            .add_entry(split_entry(
                "One more",
                "2025-03-02",
                MAX_AMOUNT_CENTS,
                0,
                MAX_AMOUNT_CENTS,
                0,
            ))
            .await,
        Err(AppError::Overflow(_))
    ));
    assert_eq!(ledger.snapshot(), full);

    ledger
        .add_entry(split_entry("Coffee", "2025-03-03", -450, 0, -450, 0))
        .await?;
    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.entries.len(), full.entries.len() + 1);
    assert_eq!(snapshot.summary.total_cents, full.summary.total_cents - 450);

    Ok(())
}

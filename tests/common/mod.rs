// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use sparkledger::application::LedgerService;
use sparkledger::domain::{Allocation, Cents, LedgerEntry, NewEntry, Record, MAX_AMOUNT_CENTS};
use sparkledger::storage::{CollectionPath, DocumentStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

pub const USER: &str = "user-1";

/// Helper to create a service bound to [`USER`] over an in-memory store
pub fn test_service() -> Result<(LedgerService, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::new());
    let mut service = LedgerService::new(store.clone());
    service.bind_user(USER)?;
    Ok((service, store))
}

/// Helper to create a bound service with a temporary SQLite database
pub async fn sqlite_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init(db_path.to_str().unwrap()).await?;
    let mut service = LedgerService::new(Arc::new(store));
    service.bind_user(USER)?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Entry fields with an explicit save / spend / give split
pub fn split_entry(
    name: &str,
    date: &str,
    total: Cents,
    save: Cents,
    spend: Cents,
    give: Cents,
) -> NewEntry {
    NewEntry::new(name, parse_date(date), total).with_allocation(Allocation::new(save, spend, give))
}

/// Write a raw record straight into a user's collection, bypassing the service
pub async fn seed_record(store: &MemoryStore, uid: &str, id: &str, record: Record) -> Result<()> {
    let path = CollectionPath::transactions_for(uid)?;
    store.set_document(&path, id, record).await?;
    Ok(())
}

/// Number of largest-amount entries whose totals still fit in `Cents`
pub const MAX_ENTRIES_THAT_FIT: i64 = i64::MAX / MAX_AMOUNT_CENTS;

/// Seed `count` entries of the largest supported amount for [`USER`]
pub async fn seed_largest_entries(store: &MemoryStore, count: i64) -> Result<()> {
    for _ in 0..count {
        let entry = LedgerEntry::create(split_entry(
            "Max",
            "2025-03-01",
            MAX_AMOUNT_CENTS,
            0,
            MAX_AMOUNT_CENTS,
            0,
        ));
        seed_record(store, USER, &entry.id.to_string(), entry.to_record()).await?;
    }
    Ok(())
}

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::domain::Record;

use super::{CollectionPath, DocumentStore, StoreError};

/// In-memory document store for development and testing.
///
/// Can be switched offline to make every call fail with
/// [`StoreError::Unavailable`], the way a dropped connection would, or made
/// to refuse every call with [`StoreError::PermissionDenied`], the way a
/// backend rejects a caller its access rules do not admit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionPath, HashMap<String, Record>>>,
    offline: AtomicBool,
    denied: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    /// Number of documents held in `collection`.
    pub fn document_count(&self, collection: &CollectionPath) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    fn check_access(&self, collection: &CollectionPath) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        if self.denied.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(format!(
                "access to {} refused",
                collection
            )));
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn set_document(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Record,
    ) -> Result<(), StoreError> {
        self.check_access(collection)?;
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection.clone())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn get_documents(&self, collection: &CollectionPath) -> Result<Vec<Record>, StoreError> {
        self.check_access(collection)?;
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_document(
        &self,
        collection: &CollectionPath,
        id: &str,
    ) -> Result<(), StoreError> {
        self.check_access(collection)?;
        let mut collections = self.collections.write().map_err(poisoned)?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(name: &str) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), json!(name));
        record
    }

    #[tokio::test]
    async fn test_set_overwrites_same_id() {
        let store = MemoryStore::new();
        let path = CollectionPath::transactions_for("u1").unwrap();

        store.set_document(&path, "a", doc("first")).await.unwrap();
        store.set_document(&path, "a", doc("second")).await.unwrap();

        let docs = store.get_documents(&path).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "second");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        let alice = CollectionPath::transactions_for("alice").unwrap();
        let bob = CollectionPath::transactions_for("bob").unwrap();

        store.set_document(&alice, "a", doc("rent")).await.unwrap();

        assert_eq!(store.document_count(&alice), 1);
        assert!(store.get_documents(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        let path = CollectionPath::transactions_for("u1").unwrap();
        store.delete_document(&path, "nope").await.unwrap();

        store.set_document(&path, "a", doc("x")).await.unwrap();
        store.delete_document(&path, "a").await.unwrap();
        store.delete_document(&path, "a").await.unwrap();
        assert_eq!(store.document_count(&path), 0);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = MemoryStore::new();
        let path = CollectionPath::transactions_for("u1").unwrap();
        store.set_offline(true);

        assert!(matches!(
            store.set_document(&path, "a", doc("x")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.get_documents(&path).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.delete_document(&path, "a").await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_offline(false);
        assert!(store.get_documents(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_denied_store_refuses_every_call() {
        let store = MemoryStore::new();
        let path = CollectionPath::transactions_for("u1").unwrap();
        store.set_document(&path, "a", doc("x")).await.unwrap();
        store.set_denied(true);

        assert!(matches!(
            store.set_document(&path, "b", doc("y")).await,
            Err(StoreError::PermissionDenied(msg)) if msg.contains("users/u1/transactions")
        ));
        assert!(matches!(
            store.get_documents(&path).await,
            Err(StoreError::PermissionDenied(_))
        ));
        assert!(matches!(
            store.delete_document(&path, "a").await,
            Err(StoreError::PermissionDenied(_))
        ));
        assert_eq!(store.document_count(&path), 1);

        store.set_denied(false);
        assert_eq!(store.get_documents(&path).await.unwrap().len(), 1);
    }
}

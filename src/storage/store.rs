use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{EntryId, LedgerEntry, Record};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid collection path: {0}")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Address of a document collection, e.g. `users/{uid}/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// The transactions collection owned by `uid`.
    pub fn transactions_for(uid: &str) -> Result<Self, StoreError> {
        if uid.trim().is_empty() || uid.contains('/') {
            return Err(StoreError::InvalidPath(format!(
                "user id {:?} cannot name a collection",
                uid
            )));
        }
        Ok(Self(format!("users/{}/transactions", uid)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document database addressed by collection path and document id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite the document `id` in `collection`.
    async fn set_document(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Record,
    ) -> Result<(), StoreError>;

    /// All documents in `collection`, in no particular order.
    async fn get_documents(&self, collection: &CollectionPath) -> Result<Vec<Record>, StoreError>;

    /// Remove the document `id` from `collection`. Absent ids are not an error.
    async fn delete_document(&self, collection: &CollectionPath, id: &str)
    -> Result<(), StoreError>;
}

/// Persistence contract for one account's ledger entries.
///
/// Each call is independent; there are no multi-entry transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Upsert keyed by `entry.id`. Returns once the entry is durably recorded.
    async fn put(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Every stored record for the account, unparsed and unordered.
    async fn list_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Remove the entry with `id` if present.
    async fn delete(&self, id: EntryId) -> Result<(), StoreError>;
}

/// A [`LedgerStore`] over one user's transactions collection.
pub struct UserLedgerStore {
    documents: Arc<dyn DocumentStore>,
    collection: CollectionPath,
}

impl UserLedgerStore {
    pub fn new(documents: Arc<dyn DocumentStore>, uid: &str) -> Result<Self, StoreError> {
        Ok(Self {
            documents,
            collection: CollectionPath::transactions_for(uid)?,
        })
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }
}

#[async_trait]
impl LedgerStore for UserLedgerStore {
    async fn put(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        tracing::debug!(collection = %self.collection, id = %entry.id, "put entry");
        self.documents
            .set_document(&self.collection, &entry.id.to_string(), entry.to_record())
            .await
    }

    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(collection = %self.collection, "list entries");
        self.documents.get_documents(&self.collection).await
    }

    async fn delete(&self, id: EntryId) -> Result<(), StoreError> {
        tracing::debug!(collection = %self.collection, %id, "delete entry");
        self.documents
            .delete_document(&self.collection, &id.to_string())
            .await
    }
}

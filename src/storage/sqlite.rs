use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::Record;

use super::{CollectionPath, DocumentStore, StoreError, MIGRATION_001_DOCUMENTS};

/// Document store persisted in a local SQLite database.
///
/// Each document is one row keyed by `(collection, id)` with its fields kept
/// as a JSON object.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to an existing database file.
    pub async fn open(database_path: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}", database_path)).await?;
        Ok(Self::new(pool))
    }

    /// Create the database file if needed and run migrations.
    pub async fn init(database_path: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", database_path)).await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(MIGRATION_001_DOCUMENTS)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn set_document(
        &self,
        collection: &CollectionPath,
        id: &str,
        data: Record,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(&data)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_documents(&self, collection: &CollectionPath) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let data: String = row.get("data");
            match serde_json::from_str::<Record>(&data) {
                Ok(record) => documents.push(record),
                Err(e) => {
                    tracing::warn!(%collection, %id, error = %e, "skipping unreadable document");
                }
            }
        }

        Ok(documents)
    }

    async fn delete_document(
        &self,
        collection: &CollectionPath,
        id: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

use std::sync::Arc;

use serde::Serialize;

use crate::auth::AuthProvider;
use crate::domain::{
    validate_submission, Cents, EntryId, LedgerEntry, LedgerSummary, NewEntry,
};
use crate::storage::{DocumentStore, LedgerStore, UserLedgerStore};

use super::AppError;

/// Owns the locally cached entries and their summary for one user, and keeps
/// them in step with the store.
///
/// A service starts unbound. Until [`LedgerService::bind_user`] succeeds every
/// store-backed operation fails with [`AppError::NotBound`]. Binding is
/// one-way.
pub struct LedgerService {
    documents: Arc<dyn DocumentStore>,
    binding: Option<Binding>,
    entries: Vec<LedgerEntry>,
    summary: LedgerSummary,
}

struct Binding {
    uid: String,
    store: Box<dyn LedgerStore>,
}

/// Outcome of a refresh from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub loaded: usize,
    /// Records dropped because they could not be parsed or would overflow
    /// the totals.
    pub skipped: usize,
}

/// A consistent copy of the cached entries and their summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub entries: Vec<LedgerEntry>,
    pub summary: LedgerSummary,
}

impl LedgerService {
    /// Create an unbound service over the given document store.
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            binding: None,
            entries: Vec::new(),
            summary: LedgerSummary::default(),
        }
    }

    // ========================
    // Binding
    // ========================

    /// Target the transactions collection of `uid`.
    pub fn bind_user(&mut self, uid: &str) -> Result<(), AppError> {
        if let Some(binding) = &self.binding {
            return Err(AppError::AlreadyBound(binding.uid.clone()));
        }
        let store = UserLedgerStore::new(Arc::clone(&self.documents), uid)?;
        tracing::info!(uid, collection = %store.collection(), "ledger bound");
        self.binding = Some(Binding {
            uid: uid.to_string(),
            store: Box::new(store),
        });
        Ok(())
    }

    /// Bind to whoever the auth provider reports as signed in.
    pub fn bind_authenticated(&mut self, auth: &dyn AuthProvider) -> Result<(), AppError> {
        let user = auth.authenticated_user()?;
        self.bind_user(&user.uid)
    }

    pub fn uid(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.uid.as_str())
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn store(&self) -> Result<&dyn LedgerStore, AppError> {
        self.binding
            .as_ref()
            .map(|b| b.store.as_ref())
            .ok_or(AppError::NotBound)
    }

    // ========================
    // Entry operations
    // ========================

    /// Validate and persist a new entry, then append it locally.
    ///
    /// Nothing is written when validation fails or the totals could not take
    /// the entry, and local state is untouched when the store rejects the
    /// write.
    pub async fn add_entry(&mut self, fields: NewEntry) -> Result<LedgerEntry, AppError> {
        let store = self.store()?;
        validate_submission(&fields.name, fields.total_cents, &fields.allocation)?;

        let entry = LedgerEntry::create(fields);
        let summary = self.summary.including(&entry)?;
        store.put(&entry).await?;

        tracing::info!(
            id = %entry.id,
            name = %entry.name,
            total = entry.total_cents,
            "entry added"
        );
        self.summary = summary;
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Delete an entry from the store and, if cached, from the local list.
    ///
    /// Returns the removed local entry. The total is unchanged when `id` was
    /// not cached even though the store deletion succeeded.
    pub async fn delete_entry(&mut self, id: EntryId) -> Result<Option<LedgerEntry>, AppError> {
        let store = self.store()?;
        let cached = match self.entries.iter().position(|e| e.id == id) {
            Some(index) => Some((index, self.summary.excluding(&self.entries[index])?)),
            None => None,
        };
        store.delete(id).await?;

        match cached {
            Some((index, summary)) => {
                let entry = self.entries.remove(index);
                self.summary = summary;
                tracing::info!(%id, total = entry.total_cents, "entry deleted");
                Ok(Some(entry))
            }
            None => {
                tracing::info!(%id, "entry deleted from store; not cached locally");
                Ok(None)
            }
        }
    }

    /// Reload every entry from the store, most recent first, and recompute
    /// the summary. Records that fail to parse are dropped, as are entries
    /// the totals cannot absorb.
    pub async fn refresh(&mut self) -> Result<RefreshReport, AppError> {
        let records = self.store()?.list_all().await?;

        let mut skipped = 0;
        let mut entries: Vec<LedgerEntry> = records
            .iter()
            .filter_map(|record| match LedgerEntry::from_record(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        id = record.get("id").and_then(|v| v.as_str()).unwrap_or("?"),
                        error = %e,
                        "dropping unparsable record"
                    );
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        let mut summary = LedgerSummary::default();
        entries.retain(|entry| match summary.including(entry) {
            Ok(next) => {
                summary = next;
                true
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!(id = %entry.id, error = %e, "dropping entry");
                false
            }
        });

        self.summary = summary;
        self.entries = entries;

        let report = RefreshReport {
            loaded: self.entries.len(),
            skipped,
        };
        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped,
            total = self.summary.total_cents,
            "ledger refreshed"
        );
        Ok(report)
    }

    // ========================
    // Queries
    // ========================

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get_entry(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Running total of the cached entries.
    pub fn total(&self) -> Cents {
        self.summary.total_cents
    }

    pub fn summary(&self) -> LedgerSummary {
        self.summary
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            entries: self.entries.clone(),
            summary: self.summary,
        }
    }
}

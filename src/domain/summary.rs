use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Allocation, Cents, LedgerEntry};

/// The totals cannot absorb another entry without leaving the `Cents` range.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ledger totals would overflow")]
pub struct SummaryOverflow;

/// Totals derived from a set of entries. Never persisted; always recomputed
/// from the entries it describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub entry_count: usize,
    pub total_cents: Cents,
    /// Per-bucket totals across all entries.
    pub buckets: Allocation,
}

impl LedgerSummary {
    pub fn from_entries(entries: &[LedgerEntry]) -> Result<Self, SummaryOverflow> {
        entries
            .iter()
            .try_fold(Self::default(), |summary, entry| summary.including(entry))
    }

    /// The summary with one more entry accounted for.
    pub fn including(&self, entry: &LedgerEntry) -> Result<Self, SummaryOverflow> {
        Ok(Self {
            entry_count: self.entry_count + 1,
            ..self.combine(entry, Cents::checked_add)?
        })
    }

    /// The summary without an entry previously included.
    pub fn excluding(&self, entry: &LedgerEntry) -> Result<Self, SummaryOverflow> {
        Ok(Self {
            entry_count: self.entry_count.saturating_sub(1),
            ..self.combine(entry, Cents::checked_sub)?
        })
    }

    fn combine(
        &self,
        entry: &LedgerEntry,
        op: fn(Cents, Cents) -> Option<Cents>,
    ) -> Result<Self, SummaryOverflow> {
        let step = |acc: Cents, amount: Cents| op(acc, amount).ok_or(SummaryOverflow);
        Ok(Self {
            entry_count: self.entry_count,
            total_cents: step(self.total_cents, entry.total_cents)?,
            buckets: Allocation {
                save: step(self.buckets.save, entry.allocation.save)?,
                spend: step(self.buckets.spend, entry.allocation.spend)?,
                give: step(self.buckets.give, entry.allocation.give)?,
            },
        })
    }
}

/// Running total: the sum of `total_cents` over `entries`, or `None` if it
/// does not fit in `Cents`.
pub fn running_total(entries: &[LedgerEntry]) -> Option<Cents> {
    entries
        .iter()
        .try_fold(0, |acc: Cents, e| acc.checked_add(e.total_cents))
}

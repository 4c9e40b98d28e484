use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::LedgerSnapshot;
use crate::domain::{format_cents, LedgerEntry, LedgerSummary};

/// JSON export document
#[derive(Debug, Clone, Serialize)]
pub struct LedgerExport<'a> {
    pub version: &'static str,
    pub exported_at: DateTime<Utc>,
    pub uid: Option<&'a str>,
    pub summary: LedgerSummary,
    pub entries: &'a [LedgerEntry],
}

/// Writes a ledger snapshot out as CSV or JSON
pub struct Exporter<'a> {
    snapshot: &'a LedgerSnapshot,
    uid: Option<&'a str>,
}

impl<'a> Exporter<'a> {
    pub fn new(snapshot: &'a LedgerSnapshot) -> Self {
        Self {
            snapshot,
            uid: None,
        }
    }

    /// Tag the JSON export with the owning user.
    pub fn for_user(mut self, uid: &'a str) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Export entries to CSV, amounts in decimal units
    pub fn export_entries_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id", "date", "name", "total", "save", "spend", "give",
        ])?;

        for entry in &self.snapshot.entries {
            csv_writer.write_record([
                entry.id.to_string(),
                entry.date.format("%Y-%m-%d").to_string(),
                entry.name.clone(),
                format_cents(entry.total_cents),
                format_cents(entry.allocation.save),
                format_cents(entry.allocation.spend),
                format_cents(entry.allocation.give),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.snapshot.entries.len())
    }

    /// Export entries and summary as pretty-printed JSON
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let export = LedgerExport {
            version: env!("CARGO_PKG_VERSION"),
            exported_at: Utc::now(),
            uid: self.uid,
            summary: self.snapshot.summary,
            entries: &self.snapshot.entries,
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(self.snapshot.entries.len())
    }
}

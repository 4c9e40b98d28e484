use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::application::{LedgerHandle, LedgerService};
use crate::auth::{AuthProvider, StaticSession};
use crate::domain::{format_cents, parse_cents, Allocation, NewEntry};
use crate::io::Exporter;
use crate::storage::SqliteStore;

/// SparkLedger - save / spend / give transaction ledger
#[derive(Parser)]
#[command(name = "sparkledger")]
#[command(about = "Track transactions and how each one splits across save, spend and give")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SPARKLEDGER_DB", default_value = "sparkledger.db")]
    pub database: String,

    /// Signed-in user id
    #[arg(short, long, env = "SPARKLEDGER_USER", global = true)]
    pub user: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a transaction
    Add {
        /// Name of the transaction
        name: String,

        /// Total amount (e.g., "100.00" or "100")
        total: String,

        /// Amount put towards saving
        #[arg(long, default_value = "0")]
        save: String,

        /// Amount spent (defaults to whatever save and give leave of the total)
        #[arg(long)]
        spend: Option<String>,

        /// Amount given away
        #[arg(long, default_value = "0")]
        give: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions, most recent first
    List {
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete a transaction by id
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Show the running total and per-bucket totals
    Total,

    /// Export transactions
    Export {
        /// Output format
        #[arg(value_enum)]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                SqliteStore::init(&self.database)
                    .await
                    .with_context(|| format!("Failed to initialize {}", self.database))?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Add {
                ref name,
                ref total,
                ref save,
                ref spend,
                ref give,
                ref date,
            } => {
                let total_cents = parse_amount(total)?;
                let save_cents = parse_amount(save)?;
                let give_cents = parse_amount(give)?;
                let spend_cents = match spend {
                    Some(s) => parse_amount(s)?,
                    None => total_cents.saturating_sub(save_cents).saturating_sub(give_cents),
                };
                let date = match date {
                    Some(date_str) => parse_date(date_str)?,
                    None => Local::now().date_naive(),
                };

                let ledger = self.open_ledger().await?;
                let fields = NewEntry::new(name.clone(), date, total_cents)
                    .with_allocation(Allocation::new(save_cents, spend_cents, give_cents));
                let entry = ledger.add_entry(fields).await?;

                println!(
                    "Recorded: {} {} (save {}, spend {}, give {}) on {} ({})",
                    entry.name,
                    format_cents(entry.total_cents),
                    format_cents(entry.allocation.save),
                    format_cents(entry.allocation.spend),
                    format_cents(entry.allocation.give),
                    entry.date,
                    entry.id
                );
                println!("Total: {}", format_cents(ledger.snapshot().summary.total_cents));
            }

            Commands::List { limit } => {
                let ledger = self.open_ledger().await?;
                run_list_command(&ledger, limit);
            }

            Commands::Delete { ref id } => {
                let id = Uuid::parse_str(id).context("Invalid transaction ID")?;
                let ledger = self.open_ledger().await?;
                match ledger.delete_entry(id).await? {
                    Some(entry) => println!(
                        "Deleted: {} {} ({})",
                        entry.name,
                        format_cents(entry.total_cents),
                        entry.id
                    ),
                    None => println!("No transaction {} found; nothing cached to remove.", id),
                }
                println!("Total: {}", format_cents(ledger.snapshot().summary.total_cents));
            }

            Commands::Total => {
                let ledger = self.open_ledger().await?;
                let summary = ledger.snapshot().summary;
                println!("Transactions: {}", summary.entry_count);
                println!("Total:        {}", format_cents(summary.total_cents));
                println!("  Save:       {}", format_cents(summary.buckets.save));
                println!("  Spend:      {}", format_cents(summary.buckets.spend));
                println!("  Give:       {}", format_cents(summary.buckets.give));
            }

            Commands::Export { format, ref output } => {
                let ledger = self.open_ledger().await?;
                let snapshot = ledger.snapshot();
                let uid = self.session().authenticated_user()?.uid;
                let exporter = Exporter::new(&snapshot).for_user(&uid);

                let writer: Box<dyn Write> = match output {
                    Some(path) => Box::new(
                        File::create(path).with_context(|| format!("Cannot create {}", path))?,
                    ),
                    None => Box::new(io::stdout().lock()),
                };

                let count = match format {
                    ExportFormat::Csv => exporter.export_entries_csv(writer)?,
                    ExportFormat::Json => exporter.export_json(writer)?,
                };

                if let Some(path) = output {
                    println!("Exported {} transactions to {}", count, path);
                }
            }
        }

        Ok(())
    }

    fn session(&self) -> StaticSession {
        StaticSession::from_option(self.user.clone())
    }

    /// Open the database, bind the signed-in user and load their entries.
    async fn open_ledger(&self) -> Result<LedgerHandle> {
        let store = SqliteStore::open(&self.database).await.with_context(|| {
            format!(
                "Failed to open {}. Run 'sparkledger init' first",
                self.database
            )
        })?;

        let ledger = LedgerHandle::spawn(LedgerService::new(Arc::new(store)));
        ledger
            .bind_authenticated(&self.session())
            .await
            .context("Pass --user or set SPARKLEDGER_USER")?;

        let report = ledger.refresh().await?;
        if report.skipped > 0 {
            eprintln!(
                "Warning: skipped {} unreadable transactions",
                report.skipped
            );
        }
        Ok(ledger)
    }
}

fn run_list_command(ledger: &LedgerHandle, limit: Option<usize>) {
    let snapshot = ledger.snapshot();

    if snapshot.entries.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:<10} {:<24} {:>10} {:>10} {:>10} {:>10}  ID",
        "DATE", "DAY", "NAME", "TOTAL", "SAVE", "SPEND", "GIVE"
    );
    println!("{}", "-".repeat(130));

    let shown = limit.unwrap_or(snapshot.entries.len());
    for entry in snapshot.entries.iter().take(shown) {
        println!(
            "{:<12} {:<10} {:<24} {:>10} {:>10} {:>10} {:>10}  {}",
            entry.date.format("%Y-%m-%d"),
            entry.date.format("%A"),
            truncate(&entry.name, 24),
            format_cents(entry.total_cents),
            format_cents(entry.allocation.save),
            format_cents(entry.allocation.spend),
            format_cents(entry.allocation.give),
            entry.id
        );
    }

    println!("{}", "-".repeat(130));
    println!("Total: {}", format_cents(snapshot.summary.total_cents));
}

fn parse_amount(input: &str) -> Result<i64> {
    parse_cents(input)
        .with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

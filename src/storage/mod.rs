mod memory;
mod sqlite;
mod store;

pub use memory::*;
pub use sqlite::*;
pub use store::*;

/// SQL migration for the documents table
pub const MIGRATION_001_DOCUMENTS: &str = include_str!("migrations/001_documents.sql");

// Application layer - use cases and orchestration.
// `LedgerService` holds the cached ledger for one user; `LedgerHandle` runs a
// service on its own task so every mutation is applied by a single owner.

pub mod error;
mod handle;
mod service;

pub use error::*;
pub use handle::*;
pub use service::*;

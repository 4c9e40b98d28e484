use thiserror::Error;

use crate::auth::AuthError;
use crate::domain::{SummaryOverflow, ValidationError};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger is not bound to a user")]
    NotBound,

    #[error("Ledger is already bound to user {0}")]
    AlreadyBound(String),

    #[error("Invalid entry: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger totals out of range: {0}")]
    Overflow(#[from] SummaryOverflow),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Ledger task has stopped")]
    TaskStopped,
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{amount_in_range, format_cents, Cents, MAX_AMOUNT_CENTS};

/// How a transaction's total is split across the save, spend and give buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub save: Cents,
    pub spend: Cents,
    pub give: Cents,
}

impl Allocation {
    pub fn new(save: Cents, spend: Cents, give: Cents) -> Self {
        Self { save, spend, give }
    }

    /// Put the whole total into the spend bucket.
    pub fn all_spend(total: Cents) -> Self {
        Self::new(0, total, 0)
    }

    /// Sum of the three buckets, or `None` on overflow.
    pub fn sum(&self) -> Option<Cents> {
        self.save
            .checked_add(self.spend)
            .and_then(|s| s.checked_add(self.give))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Entry name must not be empty")]
    EmptyName,

    #[error("Entry total must not be zero")]
    ZeroTotal,

    #[error(
        "The {} amount {} is out of range (limit {})",
        .0,
        format_cents(*.1),
        format_cents(MAX_AMOUNT_CENTS)
    )]
    AmountOutOfRange(&'static str, Cents),

    #[error(
        "Allocation does not match total: save + spend + give = {}, total = {}",
        describe_sum(.allocated),
        format_cents(*.total)
    )]
    AllocationMismatch {
        total: Cents,
        allocated: Option<Cents>,
    },
}

fn describe_sum(allocated: &Option<Cents>) -> String {
    match allocated {
        Some(sum) => format_cents(*sum),
        None => "overflow".to_string(),
    }
}

/// The allocation rule: the three buckets must sum exactly to the total.
pub fn validate_allocation(total: Cents, allocation: &Allocation) -> Result<(), ValidationError> {
    match allocation.sum() {
        Some(sum) if sum == total => Ok(()),
        allocated => Err(ValidationError::AllocationMismatch { total, allocated }),
    }
}

/// Checks applied before an entry is submitted: a non-blank name, a non-zero
/// total, every amount within [`MAX_AMOUNT_CENTS`], then the allocation rule.
pub fn validate_submission(
    name: &str,
    total: Cents,
    allocation: &Allocation,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if total == 0 {
        return Err(ValidationError::ZeroTotal);
    }
    for (label, amount) in [
        ("total", total),
        ("save", allocation.save),
        ("spend", allocation.spend),
        ("give", allocation.give),
    ] {
        if !amount_in_range(amount) {
            return Err(ValidationError::AmountOutOfRange(label, amount));
        }
    }
    validate_allocation(total, allocation)
}

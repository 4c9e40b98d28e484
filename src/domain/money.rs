use thiserror::Error;

/// Amounts are integer cents so that allocation checks are exact.
/// 1 unit = 100 cents, so 12.34 = 1234 cents.
pub type Cents = i64;

/// Largest magnitude an amount may have: 9,999,999,999,999.99.
/// Up to this bound a cents value survives conversion to a decimal number in
/// major units and back without loss.
pub const MAX_AMOUNT_CENTS: Cents = 999_999_999_999_999;

/// Whether `cents` lies within [`MAX_AMOUNT_CENTS`] of zero.
pub fn amount_in_range(cents: Cents) -> bool {
    cents.unsigned_abs() <= MAX_AMOUNT_CENTS.unsigned_abs()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    #[error("invalid money format: {0:?}")]
    InvalidFormat(String),

    #[error("more than two decimal places: {0:?}")]
    TooPrecise(String),

    #[error("amount out of range: {0:?}")]
    OutOfRange(String),
}

/// Format cents with two fractional digits.
/// Example: 1234 -> "12.34", -5 -> "-0.05"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a user-entered decimal amount into cents.
///
/// Accepts an optional leading sign, whole units, and up to two fractional
/// digits ("12", "12.5", "12.34", ".50"). Extra precision is rejected, not
/// rounded, and so is anything beyond [`MAX_AMOUNT_CENTS`].
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let raw = input.trim();
    let invalid = || ParseCentsError::InvalidFormat(input.to_string());

    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let (units_str, frac_str) = match unsigned.split_once('.') {
        Some((units, frac)) => (units, frac),
        None => (unsigned, ""),
    };

    if units_str.is_empty() && frac_str.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(units_str) || !all_digits(frac_str) {
        return Err(invalid());
    }
    if frac_str.len() > 2 {
        return Err(ParseCentsError::TooPrecise(input.to_string()));
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::OutOfRange(input.to_string()))?
    };
    let frac: i64 = match frac_str.len() {
        0 => 0,
        1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac_str.parse().map_err(|_| invalid())?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .filter(|c| amount_in_range(*c))
        .ok_or_else(|| ParseCentsError::OutOfRange(input.to_string()))?;

    Ok(if negative { -cents } else { cents })
}

/// Convert a decimal amount in major units (as held by the document store)
/// to cents, rounding to the nearest cent. Amounts beyond
/// [`MAX_AMOUNT_CENTS`] give `None`.
pub fn cents_from_major(amount: f64) -> Option<Cents> {
    if !amount.is_finite() {
        return None;
    }
    let scaled = (amount * 100.0).round();
    if scaled.abs() > MAX_AMOUNT_CENTS as f64 {
        return None;
    }
    Some(scaled as Cents)
}

/// Convert cents to a decimal amount in major units for storage.
pub fn cents_to_major(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::{amount_in_range, cents_from_major, cents_to_major, Allocation, Cents};

pub type EntryId = Uuid;

/// An untyped key-value document as held by the document store.
pub type Record = Map<String, Value>;

pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_DATE: &str = "date";
pub const FIELD_TOTAL: &str = "totalAmount";
pub const FIELD_SAVE: &str = "saveAmount";
pub const FIELD_SPEND: &str = "spendAmount";
pub const FIELD_GIVE: &str = "giveAmount";

/// One recorded transaction and how its total is allocated.
/// Entries are immutable once created; there is no edit operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub name: String,
    pub date: NaiveDate,
    pub total_cents: Cents,
    pub allocation: Allocation,
}

/// User-supplied fields for a new entry, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub name: String,
    pub date: NaiveDate,
    pub total_cents: Cents,
    pub allocation: Allocation,
}

impl NewEntry {
    pub fn new(name: impl Into<String>, date: NaiveDate, total_cents: Cents) -> Self {
        Self {
            name: name.into(),
            date,
            total_cents,
            allocation: Allocation::all_spend(total_cents),
        }
    }

    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }
}

/// Why a stored record could not be turned into an entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has the wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{field}` has an invalid value: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

impl LedgerEntry {
    /// Build an entry from explicit fields, assigning a fresh id.
    pub fn create(fields: NewEntry) -> Self {
        Self::with_id(Uuid::new_v4(), fields)
    }

    pub fn with_id(id: EntryId, fields: NewEntry) -> Self {
        Self {
            id,
            name: fields.name,
            date: fields.date,
            total_cents: fields.total_cents,
            allocation: fields.allocation,
        }
    }

    /// Encode as a store document. The date is written as a timestamp at
    /// midnight UTC and amounts as decimal numbers in major units.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(FIELD_ID.into(), Value::String(self.id.to_string()));
        record.insert(FIELD_NAME.into(), Value::String(self.name.clone()));
        record.insert(FIELD_DATE.into(), encode_timestamp(self.date));
        record.insert(FIELD_TOTAL.into(), json!(cents_to_major(self.total_cents)));
        record.insert(FIELD_SAVE.into(), json!(cents_to_major(self.allocation.save)));
        record.insert(
            FIELD_SPEND.into(),
            json!(cents_to_major(self.allocation.spend)),
        );
        record.insert(FIELD_GIVE.into(), json!(cents_to_major(self.allocation.give)));
        record
    }

    /// Decode a store document. Every field is required; extra keys are ignored.
    pub fn from_record(record: &Record) -> Result<Self, ParseError> {
        let id_str = string_field(record, FIELD_ID)?;
        let id = Uuid::parse_str(id_str).map_err(|e| ParseError::InvalidValue {
            field: FIELD_ID,
            reason: e.to_string(),
        })?;
        let date = decode_timestamp(field(record, FIELD_DATE)?)?;
        let name = string_field(record, FIELD_NAME)?.to_string();

        Ok(Self {
            id,
            name,
            date,
            total_cents: amount_field(record, FIELD_TOTAL)?,
            allocation: Allocation {
                save: amount_field(record, FIELD_SAVE)?,
                spend: amount_field(record, FIELD_SPEND)?,
                give: amount_field(record, FIELD_GIVE)?,
            },
        })
    }
}

fn field<'a>(record: &'a Record, name: &'static str) -> Result<&'a Value, ParseError> {
    match record.get(name) {
        Some(Value::Null) | None => Err(ParseError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn string_field<'a>(record: &'a Record, name: &'static str) -> Result<&'a str, ParseError> {
    field(record, name)?.as_str().ok_or(ParseError::WrongType {
        field: name,
        expected: "string",
    })
}

fn amount_field(record: &Record, name: &'static str) -> Result<Cents, ParseError> {
    let value = field(record, name)?;
    if let Some(whole) = value.as_i64() {
        return whole
            .checked_mul(100)
            .filter(|cents| amount_in_range(*cents))
            .ok_or_else(|| out_of_range(name));
    }
    let major = value.as_f64().ok_or(ParseError::WrongType {
        field: name,
        expected: "number",
    })?;
    cents_from_major(major).ok_or_else(|| out_of_range(name))
}

fn out_of_range(name: &'static str) -> ParseError {
    ParseError::InvalidValue {
        field: name,
        reason: "amount out of range".to_string(),
    }
}

/// Store-native timestamp: `{ "seconds": i64, "nanoseconds": u32 }`.
fn encode_timestamp(date: NaiveDate) -> Value {
    let seconds = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    json!({ "seconds": seconds, "nanoseconds": 0 })
}

fn decode_timestamp(value: &Value) -> Result<NaiveDate, ParseError> {
    let wrong_type = ParseError::WrongType {
        field: FIELD_DATE,
        expected: "timestamp",
    };
    let object = value.as_object().ok_or(wrong_type.clone())?;
    let seconds = object
        .get("seconds")
        .and_then(Value::as_i64)
        .ok_or(wrong_type.clone())?;
    let nanos = match object.get("nanoseconds") {
        None => 0,
        Some(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(wrong_type)?,
    };

    DateTime::<Utc>::from_timestamp(seconds, nanos)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ParseError::InvalidValue {
            field: FIELD_DATE,
            reason: format!("timestamp {} out of range", seconds),
        })
}

//! Timestamp revival for stored records.
//!
//! Records are stored as JSON text, so timestamp fields come back as
//! strings (or, from older writers, epoch milliseconds). Each [`Record`]
//! lists its timestamp fields in `TIMESTAMP_FIELDS`; [`decode_records`]
//! normalizes exactly those fields to RFC 3339 before typed decoding.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::Record;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Missing timestamp field {field}")]
    MissingTimestamp { field: &'static str },

    #[error("Invalid timestamp in {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Canonical textual form for stored timestamps.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(field: &'static str, value: &Value) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = || DecodeError::InvalidTimestamp {
        field,
        value: value.to_string(),
    };

    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            // Date-only values (YYYY-MM-DD) mean midnight UTC
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
                .ok_or_else(invalid)
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Normalize the named timestamp fields of one record object in place.
pub fn revive_timestamps(record: &mut Value, fields: &[&'static str]) -> Result<(), DecodeError> {
    for &field in fields {
        let slot = record
            .get_mut(field)
            .ok_or(DecodeError::MissingTimestamp { field })?;
        let ts = parse_timestamp(field, slot)?;
        *slot = Value::String(format_timestamp(&ts));
    }
    Ok(())
}

/// Decode raw record objects into typed records.
pub fn decode_records<R: Record>(raw: Vec<Value>) -> Result<Vec<R>, DecodeError> {
    raw.into_iter()
        .map(|mut value| {
            revive_timestamps(&mut value, R::TIMESTAMP_FIELDS)?;
            Ok(serde_json::from_value(value)?)
        })
        .collect()
}

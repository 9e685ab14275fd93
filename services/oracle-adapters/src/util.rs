//! Small parsing helpers shared by the venue drivers. Every venue encodes
//! numbers as either a JSON number or a JSON string; `decimal_field` accepts
//! both so each adapter doesn't re-derive the same `match`.

use chrono::{DateTime, Utc};
use oracle_types::Exchange;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::error::{AdapterError, Result};

pub(crate) fn decimal_field(exchange: Exchange, raw: &Value, field: &'static str) -> Result<Decimal> {
    let value = crate::adapter::require_field(exchange, raw, field)?;
    decimal_from_value(exchange, field, value)
}

pub(crate) fn decimal_from_value(exchange: Exchange, field: &'static str, value: &Value) -> Result<Decimal> {
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => n
            .as_f64()
            .and_then(|f| Decimal::from_str(&f.to_string()).ok()),
        _ => None,
    };
    parsed.ok_or_else(|| AdapterError::UnexpectedResponse {
        exchange,
        message: format!("field {field} was not a decimal-shaped value: {value}"),
    })
}

/// Parses an RFC 3339 timestamp into epoch milliseconds.
pub(crate) fn rfc3339_to_millis(exchange: Exchange, raw: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .map_err(|_| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("could not parse timestamp: {raw}"),
        })
}

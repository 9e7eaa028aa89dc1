//! Cursor comparison and state merging
//!
//! Cursor values are compared by kind: numbers numerically, timestamps
//! chronologically, any other strings lexicographically. A timestamp and a
//! non-timestamp string are incomparable. A missing or null cursor loses to
//! any value. Merging never moves a cursor backwards.

use super::types::StreamState;
use crate::types::{lookup_path, JsonValue, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Larger of two cursor values
///
/// Ties and values that cannot be compared keep `current`.
pub fn max_cursor(current: Option<&JsonValue>, latest: Option<&JsonValue>) -> Option<JsonValue> {
    let current = current.filter(|v| !v.is_null());
    let latest = latest.filter(|v| !v.is_null());

    match (current, latest) {
        (None, None) => None,
        (Some(value), None) | (None, Some(value)) => Some(value.clone()),
        (Some(current), Some(latest)) => match compare_cursors(current, latest) {
            Some(Ordering::Less) => Some(latest.clone()),
            _ => Some(current.clone()),
        },
    }
}

/// State after reading `latest_record`
///
/// Returns `current` with `cursor_field` set to the larger of its own value
/// and the record's. `cursor_field` may be a dotted path into the record.
pub fn get_updated_state(
    cursor_field: &str,
    current: &StreamState,
    latest_record: &Record,
) -> StreamState {
    let mut updated = current.clone();
    let merged = max_cursor(
        current.get(cursor_field),
        lookup_path(latest_record, cursor_field),
    );

    if let Some(value) = merged {
        updated.insert(cursor_field.to_string(), value);
    }
    updated
}

/// Embed a parent's final state into a sub-stream's state
pub fn with_parent_state(
    mut state: StreamState,
    parent_name: &str,
    parent_state: &StreamState,
) -> StreamState {
    state.insert(
        parent_name.to_string(),
        JsonValue::Object(parent_state.clone()),
    );
    state
}

fn compare_cursors(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => compare_numbers(x, y),
        (JsonValue::String(x), JsonValue::String(y)) => {
            match (parse_timestamp(x), parse_timestamp(y)) {
                (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
                (None, None) => Some(x.cmp(y)),
                _ => None,
            }
        }
        // Numeric ids sometimes arrive as strings
        (JsonValue::Number(x), JsonValue::String(y)) => {
            x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?)
        }
        (JsonValue::String(x), JsonValue::Number(y)) => {
            x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?)
        }
        _ => None,
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return Some(x.cmp(&y));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

/// Parse the timestamp formats the API uses, normalised to UTC
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

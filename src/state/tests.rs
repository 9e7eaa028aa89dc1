//! Tests for cursor merging and state types

use super::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn state(value: Value) -> StreamState {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

// ============================================================================
// max_cursor
// ============================================================================

#[test_case(json!(5), json!(9), json!(9) ; "larger number wins")]
#[test_case(json!(9), json!(5), json!(9) ; "smaller number never regresses")]
#[test_case(json!(10), json!(9.5), json!(10) ; "mixed integer and float")]
#[test_case(json!("2024-01-01T00:00:00Z"), json!("2024-03-01T00:00:00Z"), json!("2024-03-01T00:00:00Z") ; "later timestamp wins")]
#[test_case(json!("2024-03-01T10:00:00+02:00"), json!("2024-03-01T09:00:00Z"), json!("2024-03-01T09:00:00Z") ; "timestamps compare across offsets")]
#[test_case(json!("2024-03-01T09:00:00Z"), json!("2024-03-01T10:00:00+02:00"), json!("2024-03-01T09:00:00Z") ; "earlier instant with later wall clock loses")]
#[test_case(json!("2024-01-02 08:00:00"), json!("2024-01-02 07:00:00"), json!("2024-01-02 08:00:00") ; "naive timestamps")]
#[test_case(json!("abc"), json!("abd"), json!("abd") ; "plain strings compare lexicographically")]
#[test_case(json!(12), json!("100"), json!("100") ; "numeric string against number")]
#[test_case(json!("2024-01-01T00:00:00Z"), json!("zzz"), json!("2024-01-01T00:00:00Z") ; "timestamp against plain string keeps current")]
#[test_case(json!("abc"), json!("2024-01-01T00:00:00Z"), json!("abc") ; "plain string against timestamp keeps current")]
#[test_case(json!(7), json!(7), json!(7) ; "tie keeps current")]
fn test_max_cursor(current: Value, latest: Value, expected: Value) {
    assert_eq!(max_cursor(Some(&current), Some(&latest)), Some(expected));
}

#[test]
fn test_max_cursor_missing_values() {
    assert_eq!(max_cursor(None, None), None);
    assert_eq!(max_cursor(None, Some(&json!(3))), Some(json!(3)));
    assert_eq!(max_cursor(Some(&json!(3)), None), Some(json!(3)));
    assert_eq!(max_cursor(Some(&json!(null)), Some(&json!(3))), Some(json!(3)));
    assert_eq!(max_cursor(Some(&json!(3)), Some(&json!(null))), Some(json!(3)));
}

#[test]
fn test_max_cursor_incomparable_keeps_current() {
    let current = json!({"nested": true});
    assert_eq!(
        max_cursor(Some(&current), Some(&json!(4))),
        Some(current.clone())
    );
}

// ============================================================================
// get_updated_state
// ============================================================================

#[test]
fn test_get_updated_state_from_empty() {
    let updated = get_updated_state(
        "updated_at",
        &StreamState::new(),
        &json!({"id": 1, "updated_at": "2024-05-01T00:00:00Z"}),
    );
    assert_eq!(updated, state(json!({"updated_at": "2024-05-01T00:00:00Z"})));
}

#[test]
fn test_get_updated_state_never_regresses() {
    let current = state(json!({"id": 40}));
    let updated = get_updated_state("id", &current, &json!({"id": 12}));
    assert_eq!(updated, current);

    let updated = get_updated_state("id", &current, &json!({"id": 41}));
    assert_eq!(updated["id"], json!(41));
}

#[test]
fn test_get_updated_state_record_without_cursor() {
    let current = state(json!({"updated_at": "2024-01-01T00:00:00Z"}));
    let updated = get_updated_state("updated_at", &current, &json!({"id": 1}));
    assert_eq!(updated, current);

    let updated = get_updated_state("updated_at", &StreamState::new(), &json!({"id": 1}));
    assert!(updated.is_empty());
}

#[test]
fn test_get_updated_state_keeps_other_keys() {
    let current = state(json!({"id": 3, "events": {"updated_at": "2024-01-01T00:00:00Z"}}));
    let updated = get_updated_state("id", &current, &json!({"id": 4}));
    assert_eq!(
        updated,
        state(json!({"id": 4, "events": {"updated_at": "2024-01-01T00:00:00Z"}}))
    );
}

#[test]
fn test_get_updated_state_dotted_cursor() {
    let updated = get_updated_state(
        "attributes.updated_at",
        &StreamState::new(),
        &json!({"attributes": {"updated_at": "2024-02-02T00:00:00Z"}}),
    );
    assert_eq!(updated["attributes.updated_at"], json!("2024-02-02T00:00:00Z"));
}

#[test]
fn test_with_parent_state() {
    let parent = state(json!({"updated_at": "2024-06-01T00:00:00Z"}));
    let merged = with_parent_state(state(json!({"id": 9})), "events", &parent);
    assert_eq!(
        merged,
        state(json!({"id": 9, "events": {"updated_at": "2024-06-01T00:00:00Z"}}))
    );

    // Replaces an older parent snapshot
    let newer = state(json!({"updated_at": "2024-07-01T00:00:00Z"}));
    let merged = with_parent_state(merged, "events", &newer);
    assert_eq!(merged["events"], json!({"updated_at": "2024-07-01T00:00:00Z"}));
}

// ============================================================================
// State
// ============================================================================

#[test]
fn test_state_from_value_wrapped() {
    let parsed = State::from_value(json!({"streams": {"events": {"updated_at": "x"}}})).unwrap();
    assert_eq!(parsed.get_stream("events"), Some(&state(json!({"updated_at": "x"}))));
}

#[test]
fn test_state_from_value_flat() {
    let parsed = State::from_value(json!({"events": {"updated_at": "x"}, "invites": {"id": 3}}))
        .unwrap();
    assert_eq!(parsed.streams.len(), 2);
    assert_eq!(parsed.get_stream("invites"), Some(&state(json!({"id": 3}))));
}

#[test]
fn test_state_from_value_stream_named_streams() {
    let parsed =
        State::from_value(json!({"streams": {"id": 1}, "events": {"id": 2}})).unwrap();
    assert_eq!(parsed.get_stream("streams"), Some(&state(json!({"id": 1}))));
    assert_eq!(parsed.get_stream("events"), Some(&state(json!({"id": 2}))));
}

#[test]
fn test_state_from_value_rejects_non_objects() {
    assert!(matches!(State::from_value(json!([1])), Err(crate::Error::State { .. })));
    assert!(State::from_value(json!({"events": 5})).is_err());
}

#[test]
fn test_state_set_stream() {
    let mut s = State::new();
    assert!(s.is_empty());
    s.set_stream("events", state(json!({"updated_at": "x"})));
    assert!(!s.is_empty());
    assert_eq!(s.get_stream("events").unwrap()["updated_at"], json!("x"));
}

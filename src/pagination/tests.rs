//! Tests for pagination module

use super::*;
use crate::http::ApiResponse;
use crate::types::NextPageToken;
use serde_json::json;

fn token(page: u64) -> NextPageToken {
    let mut token = NextPageToken::new();
    token.insert("page".to_string(), json!(page));
    token
}

// ============================================================================
// NoPaginator Tests
// ============================================================================

#[test]
fn test_no_paginator_never_continues() {
    let paginator = NoPaginator;
    let response = ApiResponse::ok_json(&json!({"data": [{"id": 1}, {"id": 2}]}));

    assert!(paginator.initial_params().is_empty());
    assert!(paginator
        .next_page_token(&response, 2, None)
        .unwrap()
        .is_none());
    assert!(paginator
        .next_page_token(&response, 2, Some(&token(4)))
        .unwrap()
        .is_none());
}

// ============================================================================
// PageNumberPaginator Tests
// ============================================================================

#[test]
fn test_page_number_initial_params() {
    let paginator = PageNumberPaginator::new(50);
    let params = paginator.initial_params();
    assert_eq!(params.get("page"), Some(&"1".to_string()));
    assert_eq!(params.get("per_page"), Some(&"50".to_string()));
}

#[test]
fn test_page_number_full_page_continues() {
    let paginator = PageNumberPaginator::new(2);
    let response = ApiResponse::ok_json(&json!({"data": [{"id": 1}, {"id": 2}]}));

    let next = paginator.next_page_token(&response, 2, None).unwrap();
    assert_eq!(next, Some(token(2)));

    let next = paginator
        .next_page_token(&response, 2, Some(&token(2)))
        .unwrap();
    assert_eq!(next, Some(token(3)));
}

#[test]
fn test_page_number_short_or_empty_page_stops() {
    let paginator = PageNumberPaginator::new(10);
    let response = ApiResponse::ok_json(&json!({"data": [{"id": 1}]}));

    assert!(paginator
        .next_page_token(&response, 1, None)
        .unwrap()
        .is_none());
    assert!(paginator
        .next_page_token(&response, 0, None)
        .unwrap()
        .is_none());
}

#[test]
fn test_page_number_stops_at_total_pages() {
    let paginator = PageNumberPaginator::new(1);
    let response = ApiResponse::ok_json(&json!({
        "data": [{"id": 3}],
        "meta": {"current_page": 3, "total_pages": 3}
    }));

    assert!(paginator
        .next_page_token(&response, 1, Some(&token(3)))
        .unwrap()
        .is_none());

    let earlier = ApiResponse::ok_json(&json!({
        "data": [{"id": 1}],
        "meta": {"total_pages": "3"}
    }));
    assert_eq!(
        paginator.next_page_token(&earlier, 1, None).unwrap(),
        Some(token(2))
    );
}

#[test]
fn test_page_number_zero_based() {
    let paginator = PageNumberPaginator::new(1).with_start_page(0);
    let response = ApiResponse::ok_json(&json!({"data": [{}], "meta": {"total_pages": 2}}));

    assert_eq!(
        paginator.next_page_token(&response, 1, None).unwrap(),
        Some(token(1))
    );
    assert!(paginator
        .next_page_token(&response, 1, Some(&token(1)))
        .unwrap()
        .is_none());
}

#[test]
fn test_page_number_custom_params() {
    let paginator = PageNumberPaginator::new(5)
        .with_params("p", "size")
        .with_total_pages_path(None);
    let params = paginator.initial_params();
    assert_eq!(params.get("p"), Some(&"1".to_string()));
    assert_eq!(params.get("size"), Some(&"5".to_string()));

    let response = ApiResponse::ok_json(&json!({"meta": {"total_pages": 1}}));
    let next = paginator.next_page_token(&response, 5, None).unwrap().unwrap();
    assert_eq!(next.get("p"), Some(&json!(2)));
}

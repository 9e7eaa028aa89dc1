//! Pagination strategy implementations

use super::types::Paginator;
use crate::error::Result;
use crate::http::ApiResponse;
use crate::types::{lookup_path, NextPageToken, StringMap};
use serde_json::Value;

// ============================================================================
// No Pagination
// ============================================================================

/// Single page per slice; never asks for more
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn initial_params(&self) -> StringMap {
        StringMap::new()
    }

    fn next_page_token(
        &self,
        _response: &ApiResponse,
        _records_on_page: usize,
        _current: Option<&NextPageToken>,
    ) -> Result<Option<NextPageToken>> {
        Ok(None)
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Requests `?page=N&per_page=M`. Stops on an empty or short page, or once
/// the page number reaches the total page count reported in the body.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// First page number (usually 0 or 1)
    pub start_page: u64,
    /// Query parameter name for page size
    pub page_size_param: String,
    /// Page size value
    pub page_size: u32,
    /// Path to the total page count in the response body
    pub total_pages_path: Option<String>,
}

impl PageNumberPaginator {
    /// Create a paginator with `page`/`per_page` parameters starting at 1
    pub fn new(page_size: u32) -> Self {
        Self {
            page_param: "page".to_string(),
            start_page: 1,
            page_size_param: "per_page".to_string(),
            page_size,
            total_pages_path: Some("meta.total_pages".to_string()),
        }
    }

    /// Override the parameter names
    #[must_use]
    pub fn with_params(
        mut self,
        page_param: impl Into<String>,
        page_size_param: impl Into<String>,
    ) -> Self {
        self.page_param = page_param.into();
        self.page_size_param = page_size_param.into();
        self
    }

    /// Override the first page number
    #[must_use]
    pub fn with_start_page(mut self, start_page: u64) -> Self {
        self.start_page = start_page;
        self
    }

    /// Override (or clear) the total pages path
    #[must_use]
    pub fn with_total_pages_path(mut self, path: Option<&str>) -> Self {
        self.total_pages_path = path.map(String::from);
        self
    }

    fn current_page(&self, current: Option<&NextPageToken>) -> u64 {
        current
            .and_then(|token| token.get(&self.page_param))
            .and_then(as_u64)
            .unwrap_or(self.start_page)
    }

    fn total_pages(&self, response: &ApiResponse) -> Option<u64> {
        let path = self.total_pages_path.as_deref()?;
        let body = response.json().ok()?;
        lookup_path(&body, path).and_then(as_u64)
    }
}

impl Paginator for PageNumberPaginator {
    fn initial_params(&self) -> StringMap {
        let mut params = StringMap::new();
        params.insert(self.page_param.clone(), self.start_page.to_string());
        params.insert(self.page_size_param.clone(), self.page_size.to_string());
        params
    }

    fn next_page_token(
        &self,
        response: &ApiResponse,
        records_on_page: usize,
        current: Option<&NextPageToken>,
    ) -> Result<Option<NextPageToken>> {
        if records_on_page == 0 || records_on_page < self.page_size as usize {
            return Ok(None);
        }

        let page = self.current_page(current);

        if let Some(total) = self.total_pages(response) {
            // Zero-based numbering reaches the last page at total - 1
            let last_page = total.saturating_sub(1) + self.start_page;
            if page >= last_page {
                return Ok(None);
            }
        }

        let mut token = NextPageToken::new();
        token.insert(self.page_param.clone(), Value::from(page + 1));
        Ok(Some(token))
    }
}

/// Accept both `3` and `"3"`
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

//! Pagination trait

use crate::error::Result;
use crate::http::ApiResponse;
use crate::types::{NextPageToken, StringMap};

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Query parameters for the first request of a slice
    fn initial_params(&self) -> StringMap;

    /// Decide whether another page follows `response`
    ///
    /// `records_on_page` is the number of records parsed from `response` and
    /// `current` is the token that produced it (`None` for the first page).
    fn next_page_token(
        &self,
        response: &ApiResponse,
        records_on_page: usize,
        current: Option<&NextPageToken>,
    ) -> Result<Option<NextPageToken>>;
}

//! Pagination module
//!
//! Supports: no pagination (single page per slice), page number
//!
//! # Overview
//!
//! A paginator looks at the response just parsed and decides whether another
//! page must be requested. The answer is a [`NextPageToken`] whose fields are
//! merged into the next request's query parameters, or `None` when the slice
//! is exhausted.
//!
//! [`NextPageToken`]: crate::types::NextPageToken

mod strategies;
mod types;

pub use strategies::{NoPaginator, PageNumberPaginator};
pub use types::Paginator;

#[cfg(test)]
mod tests;

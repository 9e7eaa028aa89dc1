//! Slicer trait

use crate::types::{Record, StreamSlice};

/// Trait for slicing strategies
pub trait Slicer: Send + Sync + std::fmt::Debug {
    /// Derive slices from the parent's records
    ///
    /// Always returns at least one slice; with nothing to partition by, that
    /// slice is empty so the child still issues one request.
    fn slices(&self, parent_records: &[Record]) -> Vec<StreamSlice>;

    /// Key under which the partition value is stored in each slice
    fn slice_key(&self) -> &str;

    /// Rewrite a slice right before its requests are built
    fn resolve_slice(&self, slice: &StreamSlice) -> StreamSlice {
        slice.clone()
    }
}

/// The slice meaning "no partitioning, fetch unconditionally"
pub fn empty_slice() -> StreamSlice {
    StreamSlice::new()
}

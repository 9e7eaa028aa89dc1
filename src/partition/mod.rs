//! Slicing module
//!
//! A slice is one partition of a stream's work. Top-level streams run a single
//! empty slice; sub-streams derive one slice per parent record, keyed by the
//! parent's identifier (e.g. `{"event_id": 7}` for invites of event 7).

mod slicers;
mod types;

pub use slicers::ParentSlicer;
pub use types::{empty_slice, Slicer};

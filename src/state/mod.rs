//! State management module
//!
//! Tracks the highest cursor seen per stream so the next sync can resume.
//! State is threaded explicitly: a sub-stream's state embeds the final state
//! of its parent under the parent's name, handed over by the executor.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Per-stream state as persisted between runs
//! - `cursor` - Monotonic cursor merging (`max_cursor`, `get_updated_state`)
//! - `StateManager` - File-based state persistence

pub mod cursor;
mod manager;
mod types;

pub use cursor::{get_updated_state, max_cursor, with_parent_state};
pub use manager::StateManager;
pub use types::{State, StreamState};

#[cfg(test)]
mod tests;

//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of one stream: cursor field to highest value seen, plus the
/// parent's state under the parent's name for sub-streams
pub type StreamState = JsonObject;

/// Complete state for the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state
    #[serde(default)]
    pub streams: HashMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse state from JSON
    ///
    /// Accepts `{"streams": {...}}` as written by this source, and the flat
    /// per-stream form `{"events": {...}, "invites": {...}}` used by older
    /// harnesses.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut object) = value else {
            return Err(Error::state("State must be a JSON object"));
        };

        let streams = match object.remove("streams") {
            Some(streams) if object.is_empty() => streams,
            Some(streams) => {
                object.insert("streams".to_string(), streams);
                JsonValue::Object(object)
            }
            None => JsonValue::Object(object),
        };

        let streams: HashMap<String, StreamState> = serde_json::from_value(streams)
            .map_err(|e| Error::state(format!("Every stream state must be an object: {e}")))?;
        Ok(Self { streams })
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Replace state for a stream
    pub fn set_stream(&mut self, stream: &str, state: StreamState) {
        self.streams.insert(stream.to_string(), state);
    }

    /// Check if nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

//! Slicer implementations

use super::types::{empty_slice, Slicer};
use crate::types::{Record, StreamSlice};
use serde_json::Value;
use tracing::{debug, warn};

/// Parent stream-based slicer
///
/// Creates one slice per parent record, in parent order.
#[derive(Debug, Clone)]
pub struct ParentSlicer {
    /// Field holding the identifier on a parent record
    parent_key: String,
    /// Key to store the identifier under in the slice
    slice_key: String,
    /// List field of an enveloped parent record (`{"data": [...]}`)
    envelope_field: String,
    /// Field to pull from the first element when a slice value is a list
    nested_field: Option<String>,
}

impl ParentSlicer {
    /// Create a new parent slicer
    pub fn new(parent_key: impl Into<String>, slice_key: impl Into<String>) -> Self {
        Self {
            parent_key: parent_key.into(),
            slice_key: slice_key.into(),
            envelope_field: "data".to_string(),
            nested_field: None,
        }
    }

    /// Override the envelope list field
    #[must_use]
    pub fn with_envelope_field(mut self, field: impl Into<String>) -> Self {
        self.envelope_field = field.into();
        self
    }

    /// Drill into list-valued slices using this field of the first element
    #[must_use]
    pub fn with_nested_field(mut self, field: impl Into<String>) -> Self {
        self.nested_field = Some(field.into());
        self
    }

    /// Field holding the identifier on a parent record
    pub fn parent_key(&self) -> &str {
        &self.parent_key
    }

    /// Extract the identifier from a parent record
    ///
    /// Looks at `record[parent_key]` first, then at the first element of the
    /// envelope list for records that still carry the API envelope.
    fn extract_key(&self, record: &Record) -> Option<Value> {
        if let Some(value) = record.get(&self.parent_key).filter(|v| is_identifier(v)) {
            return Some(value.clone());
        }

        record
            .get(&self.envelope_field)
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|first| first.get(&self.parent_key))
            .filter(|v| is_identifier(v))
            .cloned()
    }
}

impl Slicer for ParentSlicer {
    fn slices(&self, parent_records: &[Record]) -> Vec<StreamSlice> {
        let mut slices = Vec::with_capacity(parent_records.len().max(1));

        for record in parent_records {
            match self.extract_key(record) {
                Some(value) => {
                    let mut slice = StreamSlice::new();
                    slice.insert(self.slice_key.clone(), value);
                    slices.push(slice);
                }
                None => {
                    warn!(
                        "Parent record has no usable '{}' field, skipping slice",
                        self.parent_key
                    );
                }
            }
        }

        if slices.is_empty() {
            debug!("No parent identifiers found, falling back to a single empty slice");
            slices.push(empty_slice());
        }

        slices
    }

    fn slice_key(&self) -> &str {
        &self.slice_key
    }

    fn resolve_slice(&self, slice: &StreamSlice) -> StreamSlice {
        let Some(nested_field) = &self.nested_field else {
            return slice.clone();
        };

        let nested = slice
            .get(&self.slice_key)
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .map(|first| first.get(nested_field).cloned().unwrap_or(Value::Null));

        match nested {
            Some(value) => {
                let mut resolved = slice.clone();
                resolved.insert(self.slice_key.clone(), value);
                resolved
            }
            None => slice.clone(),
        }
    }
}

/// Scalars that can stand in a path segment
fn is_identifier(value: &Value) -> bool {
    match value {
        Value::String(s) => !matches!(s.as_str(), "" | "." | ".."),
        Value::Number(_) => true,
        _ => false,
    }
}

//! Record extractors

use crate::error::Result;
use crate::http::ApiResponse;
use crate::types::{JsonValue, Record};
use tracing::debug;

/// Trait for turning one API response into records
pub trait RecordExtractor: Send + Sync + std::fmt::Debug {
    /// Extract the records of a response
    ///
    /// Non-success responses are an `HttpStatus` error, never zero records.
    fn extract(&self, response: &ApiResponse) -> Result<Vec<Record>>;
}

/// Extractor for list endpoints
///
/// - an object whose envelope field is an array yields each element
/// - a bare array yields each element
/// - any other body yields itself as a single record
#[derive(Debug, Clone)]
pub struct EnvelopeExtractor {
    field: String,
}

impl EnvelopeExtractor {
    /// Create an extractor for the given envelope field
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Envelope field name
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Default for EnvelopeExtractor {
    fn default() -> Self {
        Self::new("data")
    }
}

impl RecordExtractor for EnvelopeExtractor {
    fn extract(&self, response: &ApiResponse) -> Result<Vec<Record>> {
        response.error_for_status()?;
        let body = response.json()?;

        let records = match body {
            JsonValue::Object(mut object) => match object.remove(&self.field) {
                Some(JsonValue::Array(items)) => items,
                Some(other) => {
                    object.insert(self.field.clone(), other);
                    vec![JsonValue::Object(object)]
                }
                None => vec![JsonValue::Object(object)],
            },
            JsonValue::Array(items) => items,
            other => vec![other],
        };

        debug!("Extracted {} records", records.len());
        Ok(records)
    }
}

/// Extractor for single-resource endpoints: the whole body is one record
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleObjectExtractor;

impl RecordExtractor for SingleObjectExtractor {
    fn extract(&self, response: &ApiResponse) -> Result<Vec<Record>> {
        response.error_for_status()?;
        Ok(vec![response.json()?])
    }
}

//! Source trait and the Brella source
//!
//! Defines the protocol surface a harness drives (spec, check, discover,
//! read) and the messages a read produces.

use crate::config::{connection_specification, SourceConfig};
use crate::error::{Error, Result};
use crate::state::State;
use crate::stream::{StreamDefinition, StreamReader};
use crate::streams;
use crate::types::{JsonValue, LogLevel, Record, SyncMode};
use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::pin::Pin;
use tracing::{info, warn};

/// Documentation URL reported by `spec`
pub const DOCUMENTATION_URL: &str = "https://docs.airbyte.com/integrations/sources/brella";

// ============================================================================
// Connector Spec
// ============================================================================

/// Connector specification returned by spec()
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpec {
    /// Documentation URL
    pub documentation_url: String,

    /// JSON schema of the configuration
    pub connection_specification: JsonValue,
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// One stream as advertised by discover()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,
    /// JSON schema of the records
    pub json_schema: JsonValue,
    /// Supported sync modes
    pub supported_sync_modes: Vec<SyncMode>,
    /// Whether the cursor is fixed by the source
    pub source_defined_cursor: bool,
    /// Cursor field path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<Vec<String>>,
    /// Primary key paths
    pub source_defined_primary_key: Vec<Vec<String>>,
}

impl CatalogStream {
    /// Describe a stream definition
    pub fn from_definition(definition: &StreamDefinition) -> Self {
        let mut properties = serde_json::Map::new();
        properties.insert(
            definition.primary_key().to_string(),
            json!({"type": ["null", "integer", "string"]}),
        );
        if let Some(cursor) = definition.cursor_field() {
            properties
                .entry(cursor.to_string())
                .or_insert_with(|| json!({"type": ["null", "string"]}));
        }

        Self {
            name: definition.name().to_string(),
            json_schema: json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "additionalProperties": true,
                "properties": properties
            }),
            supported_sync_modes: definition.supported_sync_modes(),
            source_defined_cursor: definition.cursor_field().is_some(),
            default_cursor_field: definition.cursor_field().map(|f| vec![f.to_string()]),
            source_defined_primary_key: vec![vec![definition.primary_key().to_string()]],
        }
    }
}

/// Streams offered by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Stream descriptions, in sync order
    pub streams: Vec<CatalogStream>,
}

// ============================================================================
// Messages
// ============================================================================

/// Messages emitted during read operations
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One record
    Record {
        /// Stream name
        stream: String,
        /// Record data
        data: Record,
        /// Timestamp when the record was emitted
        emitted_at: DateTime<Utc>,
    },

    /// State checkpoint for one stream
    State {
        /// Stream name
        stream: String,
        /// Stream state
        data: JsonValue,
    },

    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, data: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            data,
            emitted_at: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(stream: impl Into<String>, data: JsonValue) -> Self {
        Self::State {
            stream: stream.into(),
            data,
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log message
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log message
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Create an error log message
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Protocol JSON for this message
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Record {
                stream,
                data,
                emitted_at,
            } => json!({
                "type": "RECORD",
                "record": {
                    "stream": stream,
                    "data": data,
                    "emitted_at": emitted_at.timestamp_millis()
                }
            }),
            Self::State { stream, data } => json!({
                "type": "STATE",
                "state": {
                    "type": "STREAM",
                    "stream": {
                        "stream_descriptor": {
                            "name": stream
                        },
                        "stream_state": data
                    }
                }
            }),
            Self::Log { level, message } => json!({
                "type": "LOG",
                "log": {
                    "level": level,
                    "message": message
                }
            }),
        }
    }
}

// ============================================================================
// Source Trait
// ============================================================================

/// Type alias for the message stream returned by read()
pub type MessageStream = Pin<Box<dyn Stream<Item = Message> + Send>>;

/// Protocol surface of a source
#[async_trait]
pub trait Source: Send + Sync {
    /// Returns the connector specification
    fn spec(&self) -> ConnectorSpec;

    /// Tests if credentials and configuration are valid
    async fn check(&self, config: &SourceConfig) -> Result<CheckResult>;

    /// Lists available streams
    async fn discover(&self, config: &SourceConfig) -> Result<Catalog>;

    /// Reads the selected streams, all of them when `streams` is empty
    ///
    /// Returns a stream of messages (records, state checkpoints, logs).
    /// A stream that fails is reported as an error log and the read moves
    /// on to the next one.
    async fn read(
        &self,
        config: &SourceConfig,
        streams: &[String],
        state: Option<&State>,
    ) -> Result<MessageStream>;
}

// ============================================================================
// Brella Source
// ============================================================================

/// Source for the Brella integration API
#[derive(Debug, Clone, Copy, Default)]
pub struct BrellaSource;

impl BrellaSource {
    /// Create the source
    pub fn new() -> Self {
        Self
    }

    /// Streams to read, in catalog order
    fn select(config: &SourceConfig, names: &[String]) -> Result<Vec<StreamDefinition>> {
        let catalog = streams::catalog(config);
        if let Some(unknown) = names
            .iter()
            .find(|name| !catalog.iter().any(|s| s.name() == name.as_str()))
        {
            return Err(Error::stream_not_found(unknown));
        }

        Ok(catalog
            .into_iter()
            .filter(|s| names.is_empty() || names.iter().any(|n| n == s.name()))
            .collect())
    }
}

#[async_trait]
impl Source for BrellaSource {
    fn spec(&self) -> ConnectorSpec {
        ConnectorSpec {
            documentation_url: DOCUMENTATION_URL.to_string(),
            connection_specification: connection_specification(),
        }
    }

    async fn check(&self, config: &SourceConfig) -> Result<CheckResult> {
        info!("Checking connection to Brella Integration API...");
        if let Err(e) = config.validate() {
            return Ok(CheckResult::failure(e.to_string()));
        }
        info!("Connection to Brella Integration API succeeded (configuration only, no request sent)");
        Ok(CheckResult::success())
    }

    async fn discover(&self, config: &SourceConfig) -> Result<Catalog> {
        Ok(Catalog {
            streams: streams::catalog(config)
                .iter()
                .map(CatalogStream::from_definition)
                .collect(),
        })
    }

    async fn read(
        &self,
        config: &SourceConfig,
        streams: &[String],
        state: Option<&State>,
    ) -> Result<MessageStream> {
        let selected = Self::select(config, streams)?;
        let reader = StreamReader::from_config(config.clone())?;
        let state = state.cloned().unwrap_or_default();

        Ok(Box::pin(stream! {
            for definition in &selected {
                let name = definition.name();
                yield Message::info(format!("Starting sync for stream: {name}"));

                let start_state = state.get_stream(name).cloned().unwrap_or_default();
                let (slices, parent_state) = match reader.stream_slices(definition, &start_state).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!("Stream {} failed while slicing: {}", name, e);
                        yield Message::error(format!("Stream {name} failed: {e}"));
                        continue;
                    }
                };

                let mut current = start_state.clone();
                let mut count = 0usize;
                let mut failure = None;

                'slices: for slice in &slices {
                    let mut records = reader.read_records(definition, &start_state, slice);
                    while let Some(record) = records.next().await {
                        match record {
                            Ok(record) => {
                                current = definition.get_updated_state(&current, &record, parent_state.as_ref());
                                count += 1;
                                yield Message::record(name, record);
                            }
                            Err(e) => {
                                failure = Some(e);
                                break 'slices;
                            }
                        }
                    }
                }

                if let Some(e) = failure {
                    warn!("Stream {} failed after {} records: {}", name, count, e);
                    yield Message::error(format!("Stream {name} failed after {count} records: {e}"));
                    continue;
                }

                let current = definition.final_state(current, parent_state.as_ref());
                yield Message::state(name, JsonValue::Object(current));
                yield Message::info(format!(
                    "Finished stream {name}: {count} records from {} slices",
                    slices.len()
                ));
            }
        }))
    }
}

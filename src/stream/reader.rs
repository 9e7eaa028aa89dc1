//! Stream executor
//!
//! Drives a definition: slices, then pages per slice, then records per page.
//! Everything runs sequentially; a sub-stream reads its whole parent before
//! issuing its own first request.

use super::definition::StreamDefinition;
use crate::config::SourceConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::partition::{empty_slice, Slicer};
use crate::state::StreamState;
use crate::types::{scalar_to_string, JsonValue, NextPageToken, Record, StreamSlice};
use async_stream::try_stream;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, info, warn};

/// Lazy, forward-only sequence of records
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<Record>> + Send + 'a>>;

/// Result of reading a stream to completion
#[derive(Debug, Clone, Default)]
pub struct StreamRead {
    /// Records in the order the API returned them
    pub records: Vec<Record>,
    /// State after the last record
    pub state: StreamState,
    /// Number of slices read
    pub slices: usize,
}

/// Executes stream definitions against the API
#[derive(Debug, Clone)]
pub struct StreamReader {
    client: HttpClient,
    config: SourceConfig,
}

impl StreamReader {
    /// Create a reader from a prepared client
    pub fn new(client: HttpClient, config: SourceConfig) -> Self {
        Self { client, config }
    }

    /// Create a reader with a client built from `config`
    pub fn from_config(config: SourceConfig) -> Result<Self> {
        let client = HttpClient::for_source(&config)?;
        Ok(Self::new(client, config))
    }

    /// Source configuration
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Read the records of one slice, following pagination
    ///
    /// Nothing is requested until the stream is polled.
    pub fn read_records<'a>(
        &'a self,
        definition: &'a StreamDefinition,
        state: &'a StreamState,
        slice: &StreamSlice,
    ) -> RecordStream<'a> {
        Box::pin(self.records(definition, state, slice.clone()))
    }

    fn records<'a>(
        &'a self,
        definition: &'a StreamDefinition,
        state: &'a StreamState,
        slice: StreamSlice,
    ) -> impl Stream<Item = Result<Record>> + Send + 'a {
        try_stream! {
            let slice = definition.resolve_slice(&slice);
            let mut done = false;
            if let Some(parent) = definition.parent() {
                let key = parent.slicer.slice_key();
                match slice.get(key).and_then(scalar_to_string) {
                    Some(value) => info!("Reading {} for {}: {}", definition.name(), key, value),
                    None => {
                        warn!("No {} in slice, nothing to read for {}", key, definition.name());
                        done = true;
                    }
                }
            }

            let mut token: Option<NextPageToken> = None;
            let mut previous: Option<Vec<Record>> = None;
            while !done {
                let path = definition.path(&self.config, state, &slice, token.as_ref())?;
                let params = definition.request_params(state, &slice, token.as_ref());
                let response = self.client.get(&path, &params).await?;

                let records = definition.parse_response(&response)?;
                // A server that ignores the page parameter serves the same page forever
                if !records.is_empty() && previous.as_ref() == Some(&records) {
                    warn!(
                        "{} returned the same page again for {:?}, stopping pagination",
                        definition.name(),
                        token
                    );
                    break;
                }

                let next = definition.next_page_token(&response, records.len(), token.as_ref())?;
                if next.is_some() {
                    previous = Some(records.clone());
                }

                for record in records {
                    yield record;
                }

                match next {
                    Some(next) => {
                        debug!("Fetching next page of {}: {:?}", definition.name(), next);
                        token = Some(next);
                    }
                    None => done = true,
                }
            }
        }
    }

    /// Slices to read for `definition`
    ///
    /// Top-level streams get one empty slice. Sub-streams read their parent
    /// to completion, starting from the parent state nested in `state`, and
    /// also return the parent's final state.
    pub fn stream_slices<'a>(
        &'a self,
        definition: &'a StreamDefinition,
        state: &'a StreamState,
    ) -> BoxFuture<'a, Result<(Vec<StreamSlice>, Option<StreamState>)>> {
        async move {
            let Some(parent) = definition.parent() else {
                return Ok((vec![empty_slice()], None));
            };

            info!("Finding parent stream {} for {}", parent.name(), definition.name());
            let parent_state = match state.get(parent.name()) {
                Some(JsonValue::Object(nested)) => nested.clone(),
                _ => StreamState::new(),
            };

            let parent_read = self.read_stream(&parent.stream, &parent_state).await?;
            let slices = parent.slicer.slices(&parent_read.records);
            info!(
                "{} stream slices from {} {} records",
                slices.len(),
                parent_read.records.len(),
                parent.name()
            );

            Ok((slices, Some(parent_read.state)))
        }
        .boxed()
    }

    /// Read a stream to completion, folding state over every record
    pub async fn read_stream(
        &self,
        definition: &StreamDefinition,
        state: &StreamState,
    ) -> Result<StreamRead> {
        let (slices, parent_state) = self.stream_slices(definition, state).await?;

        let mut read = StreamRead {
            records: Vec::new(),
            state: state.clone(),
            slices: slices.len(),
        };

        for slice in &slices {
            let mut records = self.read_records(definition, state, slice);
            while let Some(record) = records.next().await {
                let record = record?;
                read.state =
                    definition.get_updated_state(&read.state, &record, parent_state.as_ref());
                read.records.push(record);
            }
        }

        read.state = definition.final_state(read.state, parent_state.as_ref());

        Ok(read)
    }
}

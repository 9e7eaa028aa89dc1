//! Stream definitions

use super::extract::{EnvelopeExtractor, RecordExtractor};
use crate::config::SourceConfig;
use crate::error::Result;
use crate::http::ApiResponse;
use crate::pagination::{NoPaginator, Paginator};
use crate::partition::{ParentSlicer, Slicer};
use crate::state::{self, StreamState};
use crate::template::{self, TemplateContext};
use crate::types::{scalar_to_string, JsonValue, NextPageToken, Record, StreamSlice, StringMap, SyncMode};
use std::sync::Arc;
use tracing::info;

/// Link from a sub-stream to the stream its slices come from
#[derive(Debug, Clone)]
pub struct ParentLink {
    /// Parent stream
    pub stream: Arc<StreamDefinition>,
    /// How parent records become slices
    pub slicer: ParentSlicer,
}

impl ParentLink {
    /// Create a parent link
    pub fn new(stream: StreamDefinition, slicer: ParentSlicer) -> Self {
        Self {
            stream: Arc::new(stream),
            slicer,
        }
    }

    /// Parent stream name
    pub fn name(&self) -> &str {
        self.stream.name()
    }
}

/// Definition of one stream
#[derive(Debug, Clone)]
pub struct StreamDefinition {
    name: String,
    path_template: String,
    primary_key: String,
    cursor_field: Option<String>,
    extractor: Arc<dyn RecordExtractor>,
    paginator: Arc<dyn Paginator>,
    parent: Option<ParentLink>,
}

impl StreamDefinition {
    /// Start building a stream definition
    pub fn builder(name: impl Into<String>, path_template: impl Into<String>) -> StreamDefinitionBuilder {
        StreamDefinitionBuilder {
            name: name.into(),
            path_template: path_template.into(),
            primary_key: "id".to_string(),
            cursor_field: None,
            extractor: Arc::new(EnvelopeExtractor::default()),
            paginator: Arc::new(NoPaginator),
            parent: None,
        }
    }

    /// Stream name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unrendered request path
    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /// Primary key field
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Cursor field, if the stream supports incremental sync
    pub fn cursor_field(&self) -> Option<&str> {
        self.cursor_field.as_deref()
    }

    /// Parent link for sub-streams
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// Paginator in use
    pub fn paginator(&self) -> &dyn Paginator {
        self.paginator.as_ref()
    }

    /// Sync modes this stream supports
    pub fn supported_sync_modes(&self) -> Vec<SyncMode> {
        if self.cursor_field.is_some() {
            vec![SyncMode::FullRefresh, SyncMode::Incremental]
        } else {
            vec![SyncMode::FullRefresh]
        }
    }

    /// Build the request path
    ///
    /// Renders `{{ config.* }}`, `{{ slice.* }}`, `{{ state.* }}` and
    /// `{{ page.* }}` variables, each as one percent-encoded segment.
    /// Identical inputs give identical paths.
    pub fn path(
        &self,
        config: &SourceConfig,
        state: &StreamState,
        slice: &StreamSlice,
        page: Option<&NextPageToken>,
    ) -> Result<String> {
        let mut ctx = TemplateContext::with_config(config.template_values());
        ctx.set_state(JsonValue::Object(state.clone()))
            .set_slice(JsonValue::Object(slice.clone()))
            .set_page(page.cloned().map(JsonValue::Object).unwrap_or_default());
        template::render_path(&self.path_template, &ctx)
    }

    /// Query parameters for a request
    ///
    /// The paginator's base parameters, overridden by the fields of the
    /// next-page token when there is one. No Brella endpoint filters on
    /// state or slice, so neither adds parameters.
    pub fn request_params(
        &self,
        _state: &StreamState,
        _slice: &StreamSlice,
        page: Option<&NextPageToken>,
    ) -> StringMap {
        let mut params = self.paginator.initial_params();
        for (key, value) in page.into_iter().flatten() {
            if let Some(value) = scalar_to_string(value) {
                params.insert(key.clone(), value);
            }
        }
        params
    }

    /// Decide whether another page follows `response`
    pub fn next_page_token(
        &self,
        response: &ApiResponse,
        records_on_page: usize,
        current: Option<&NextPageToken>,
    ) -> Result<Option<NextPageToken>> {
        self.paginator
            .next_page_token(response, records_on_page, current)
    }

    /// Parse one response into records
    pub fn parse_response(&self, response: &ApiResponse) -> Result<Vec<Record>> {
        info!("Parsing response");
        self.extractor.extract(response)
    }

    /// State after reading `latest_record`
    ///
    /// Keeps the larger cursor value and, for sub-streams, embeds the
    /// parent's final state under the parent's name.
    pub fn get_updated_state(
        &self,
        current: &StreamState,
        latest_record: &Record,
        parent_state: Option<&StreamState>,
    ) -> StreamState {
        let updated = match &self.cursor_field {
            Some(field) => state::get_updated_state(field, current, latest_record),
            None => current.clone(),
        };
        self.final_state(updated, parent_state)
    }

    /// State to checkpoint once every slice has been read
    ///
    /// Sub-streams carry the parent snapshot even when they read nothing.
    pub fn final_state(&self, state: StreamState, parent_state: Option<&StreamState>) -> StreamState {
        match (&self.parent, parent_state) {
            (Some(parent), Some(parent_state)) => {
                state::with_parent_state(state, parent.name(), parent_state)
            }
            _ => state,
        }
    }

    /// Slice as the request should see it
    pub fn resolve_slice(&self, slice: &StreamSlice) -> StreamSlice {
        match &self.parent {
            Some(parent) => parent.slicer.resolve_slice(slice),
            None => slice.clone(),
        }
    }
}

/// Builder for `StreamDefinition`
#[derive(Debug)]
pub struct StreamDefinitionBuilder {
    name: String,
    path_template: String,
    primary_key: String,
    cursor_field: Option<String>,
    extractor: Arc<dyn RecordExtractor>,
    paginator: Arc<dyn Paginator>,
    parent: Option<ParentLink>,
}

impl StreamDefinitionBuilder {
    /// Set the primary key field (default `id`)
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Make the stream incremental on `field`
    #[must_use]
    pub fn cursor_field(mut self, field: impl Into<String>) -> Self {
        self.cursor_field = Some(field.into());
        self
    }

    /// Set the record extractor (default `EnvelopeExtractor`)
    #[must_use]
    pub fn extractor(mut self, extractor: impl RecordExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Set the paginator (default `NoPaginator`)
    #[must_use]
    pub fn paginator(mut self, paginator: impl Paginator + 'static) -> Self {
        self.paginator = Arc::new(paginator);
        self
    }

    /// Set the paginator from an already shared one
    #[must_use]
    pub fn shared_paginator(mut self, paginator: Arc<dyn Paginator>) -> Self {
        self.paginator = paginator;
        self
    }

    /// Derive slices from `parent`
    #[must_use]
    pub fn parent(mut self, parent: StreamDefinition, slicer: ParentSlicer) -> Self {
        self.parent = Some(ParentLink::new(parent, slicer));
        self
    }

    /// Finish the definition
    pub fn build(self) -> StreamDefinition {
        StreamDefinition {
            name: self.name,
            path_template: self.path_template,
            primary_key: self.primary_key,
            cursor_field: self.cursor_field,
            extractor: self.extractor,
            paginator: self.paginator,
            parent: self.parent,
        }
    }
}

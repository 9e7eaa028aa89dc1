//! Brella streams
//!
//! | Stream         | Path                                                  | Cursor       |
//! |----------------|-------------------------------------------------------|--------------|
//! | `organization` | `organizations/{organization_id}`                     | `updated_at` |
//! | `events`       | `organizations/{organization_id}/events`              | `updated_at` |
//! | `invites`      | `organizations/{organization_id}/events/{event_id}/invites` | `id`   |
//!
//! `invites` is a sub-stream of `events`, sliced by event id.

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::pagination::{NoPaginator, PageNumberPaginator, Paginator};
use crate::partition::ParentSlicer;
use crate::stream::{SingleObjectExtractor, StreamDefinition};
use std::sync::Arc;

/// Organization stream name
pub const ORGANIZATION: &str = "organization";
/// Events stream name
pub const EVENTS: &str = "events";
/// Invites stream name
pub const INVITES: &str = "invites";

/// Paginator for list endpoints: page numbers when `page_size` is set
fn list_paginator(config: &SourceConfig) -> Arc<dyn Paginator> {
    match config.page_size {
        Some(page_size) => Arc::new(PageNumberPaginator::new(page_size)),
        None => Arc::new(NoPaginator),
    }
}

/// The organization itself, fetched as one record
pub fn organization() -> StreamDefinition {
    StreamDefinition::builder(ORGANIZATION, "organizations/{{ config.organization_id }}")
        .cursor_field("updated_at")
        .extractor(SingleObjectExtractor)
        .build()
}

/// Events of the organization
pub fn events(config: &SourceConfig) -> StreamDefinition {
    StreamDefinition::builder(EVENTS, "organizations/{{ config.organization_id }}/events")
        .cursor_field("updated_at")
        .shared_paginator(list_paginator(config))
        .build()
}

/// Invites of every event
pub fn invites(config: &SourceConfig) -> StreamDefinition {
    StreamDefinition::builder(
        INVITES,
        "organizations/{{ config.organization_id }}/events/{{ slice.event_id }}/invites",
    )
    .cursor_field("id")
    .shared_paginator(list_paginator(config))
    .parent(events(config), ParentSlicer::new("id", "event_id"))
    .build()
}

/// All streams, in sync order
pub fn catalog(config: &SourceConfig) -> Vec<StreamDefinition> {
    vec![organization(), events(config), invites(config)]
}

/// Look up one stream by name
pub fn find(config: &SourceConfig, name: &str) -> Result<StreamDefinition> {
    catalog(config)
        .into_iter()
        .find(|stream| stream.name() == name)
        .ok_or_else(|| Error::stream_not_found(name))
}

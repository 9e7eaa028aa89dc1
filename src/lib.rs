// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Brella source
//!
//! Extracts organizations, events and invites from the Brella integration
//! API and emits them as Airbyte-style protocol messages.
//!
//! ## Features
//!
//! - **Header-token auth**: `Brella-API-Access-Token` on every request
//! - **Composable streams**: extractor, paginator and slicer strategies
//! - **Parent/child slicing**: invites are read once per event
//! - **Incremental state**: monotonic cursor merge, parent state nested explicitly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brella_source::{BrellaSource, Source, SourceConfig};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> brella_source::Result<()> {
//!     let config = SourceConfig::new("token", "my-org");
//!     let source = BrellaSource::new();
//!
//!     let catalog = source.discover(&config).await?;
//!
//!     let mut messages = source.read(&config, &[], None).await?;
//!     while let Some(msg) = messages.next().await {
//!         println!("{}", msg.to_json());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Source Interface                         │
//! │  spec() → ConnectorSpec   check() → CheckResult                 │
//! │  discover() → Catalog     read(streams, state) → MessageStream  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                     StreamReader (executor)
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │   Slice   │   State     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Header   │ GET       │ None          │ Parent    │ Max cursor  │
//! │ token    │ Status    │ Page number   │ Nested    │ Parent nest │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the source
pub mod error;

/// Common types and type aliases
pub mod types;

/// Source configuration
pub mod config;

/// Header-token authentication
pub mod auth;

/// HTTP client adapter
pub mod http;

/// Template interpolation for request paths
pub mod template;

/// Pagination strategies
pub mod pagination;

/// Slicing strategies
pub mod partition;

/// State management and cursor merging
pub mod state;

/// Stream definitions and executor
pub mod stream;

/// Brella stream catalog
pub mod streams;

/// Source trait and protocol messages
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::SourceConfig;
pub use connector::{BrellaSource, Message, MessageStream, Source};
pub use state::{State, StateManager};
pub use stream::{StreamDefinition, StreamReader};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

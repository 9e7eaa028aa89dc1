//! Stream module
//!
//! A stream is one API resource turned into records. Each concrete stream is
//! a `StreamDefinition` composed from three strategies:
//! - a `RecordExtractor` mapping a response to records
//! - a `Paginator` deciding whether another page follows
//! - an optional `ParentLink` deriving slices from a parent stream
//!
//! `StreamReader` executes definitions against the API.

mod definition;
mod extract;
mod reader;

pub use definition::{ParentLink, StreamDefinition, StreamDefinitionBuilder};
pub use extract::{EnvelopeExtractor, RecordExtractor, SingleObjectExtractor};
pub use reader::{RecordStream, StreamRead, StreamReader};

//! bonnet - personal knowledge graph CLI
//!
//! Typed records (entities, attributes, files) each own a node in a graph
//! index. Full-text search finds nodes and edges; bounded traversal and
//! context assembly turn the matches into a tree for rendering.
//!
//! ## Key Concepts
//!
//! - **Record vs node**: every record has exactly one node, created in the
//!   same transaction; edges only ever connect nodes
//! - **Record type registry**: table name, fields and searchable-content
//!   builder per record type, in `core::record`
//! - **Context tree**: matches under a synthetic root, expanded along
//!   outgoing edges to a fixed depth

pub mod cli;
pub mod config;
pub mod core;

pub use config::Config;
pub use core::context::{ContextNode, ContextOptions, ContextTree};
pub use core::error::{GraphError, Result};
pub use core::record::{AttributeType, Record, RecordFields, RecordType};
pub use core::search::{SearchMatch, SearchQuery};
pub use core::storage::Storage;

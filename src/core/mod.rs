//! Core module - storage, graph and retrieval
//!
//! Records live in typed tables; each one has a node in the graph index.
//! Search finds nodes, traversal and context assembly grow results along
//! edges.

pub mod context;
pub mod error;
pub mod graph;
pub mod group;
pub mod ids;
pub mod record;
pub mod resolve;
pub mod search;
pub mod storage;
pub mod traverse;

pub use error::{GraphError, Result};

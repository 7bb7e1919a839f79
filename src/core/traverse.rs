//! Traversal - bounded breadth-first expansion
//!
//! Walks the graph level by level from a seed set of nodes. Edges are
//! followed in both directions by default, so "related to" is symmetric even
//! though edges are stored directed. A visited set seeded with the starting
//! nodes keeps cycles from being walked twice.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::error::Result;
use super::graph::{Direction, Node};
use super::record::Record;
use super::storage::Storage;

/// A node reached from the seeds, resolved to its record
#[derive(Debug, Clone, Serialize)]
pub struct RelatedRecord {
    pub node: Node,
    pub record: Record,
    /// Number of edges between this node and the nearest seed
    pub hops: usize,
}

/// Traversal settings
#[derive(Debug, Clone, Copy)]
pub struct Traversal {
    pub depth: usize,
    pub direction: Direction,
}

impl Traversal {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            direction: Direction::default(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Node ids reachable from `seeds` within `depth` hops, excluding the
    /// seeds themselves, in discovery order
    pub fn reachable(&self, storage: &Storage, seeds: &[String]) -> Result<Vec<(String, usize)>> {
        let mut visited: HashSet<String> = seeds.iter().cloned().collect();
        let mut frontier: Vec<String> = Vec::new();
        for seed in seeds {
            if !frontier.contains(seed) {
                frontier.push(seed.clone());
            }
        }

        let mut reached = Vec::new();
        for level in 1..=self.depth {
            let mut next = Vec::new();
            for node_id in &frontier {
                for (_, other) in storage.neighbors(node_id, self.direction)? {
                    if visited.insert(other.clone()) {
                        reached.push((other.clone(), level));
                        next.push(other);
                    }
                }
            }
            debug!(level, found = next.len(), "traversal level");
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(reached)
    }

    /// Records related to `seeds`: reachable nodes resolved to their records
    pub fn related(&self, storage: &Storage, seeds: &[String]) -> Result<Vec<RelatedRecord>> {
        self.reachable(storage, seeds)?
            .into_iter()
            .map(|(node_id, hops)| {
                let node = storage.require_node(&node_id)?;
                let record = storage.record_for_node(&node)?;
                Ok(RelatedRecord { node, record, hops })
            })
            .collect()
    }
}

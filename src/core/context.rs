//! Context assembly
//!
//! Turns search matches into a nested tree for rendering:
//!
//! ```text
//! root
//! ├── match (record)
//! │   └── record reached by an outgoing edge (annotated with that edge)
//! │       └── ...up to `depth` edges from the match
//! └── match (record)
//! ```
//!
//! Matched nodes are reserved before any expansion, so a record that matched
//! the query always sits directly under the root. Expansion then runs level
//! by level across all matches: every node appears once, attached at its
//! shortest outgoing distance from a match. Longer paths to an already placed
//! node are dropped from the tree (the edge still exists in the graph).

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::error::Result;
use super::graph::{Direction, Edge};
use super::record::Record;
use super::search::{self, SearchMatch, SearchQuery};
use super::storage::Storage;
use super::traverse::Traversal;

/// Options for building a context tree
#[derive(Debug, Clone, Copy)]
pub struct ContextOptions {
    /// Edges to follow below each match
    pub depth: usize,
    /// Add records reachable within `depth` hops that the tree lacks
    pub include_related: bool,
    /// Direction used for the related set
    pub direction: Direction,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            include_related: false,
            direction: Direction::Both,
        }
    }
}

/// The edge that attached a node to its parent in the tree
#[derive(Debug, Clone, Serialize)]
pub struct EdgeLink {
    pub edge_id: String,
    pub edge_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<&Edge> for EdgeLink {
    fn from(edge: &Edge) -> Self {
        Self {
            edge_id: edge.id.clone(),
            edge_type: edge.edge_type.clone(),
            content: edge.searchable_content.clone(),
        }
    }
}

/// A record in the context tree
#[derive(Debug, Clone, Serialize)]
pub struct ContextNode {
    pub node_id: String,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<EdgeLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContextNode>,
}

/// Synthetic root of a context tree
#[derive(Debug, Clone, Serialize, Default)]
pub struct ContextTree {
    pub query: String,
    pub children: Vec<ContextNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<ContextNode>,
}

impl ContextTree {
    /// No matches were found
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Every node in the tree, depth-first, related section last
    pub fn iter(&self) -> impl Iterator<Item = &ContextNode> {
        let mut stack: Vec<&ContextNode> = self.related.iter().rev().collect();
        stack.extend(self.children.iter().rev());
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Search for `query` and build its context tree
pub fn assemble(
    storage: &Storage,
    query: &SearchQuery,
    options: &ContextOptions,
) -> Result<ContextTree> {
    let matches = search::search(storage, query)?;
    build(storage, &query.text, &matches, options)
}

/// Build a context tree from existing search matches.
///
/// Edge matches stand in for their source node.
pub fn build(
    storage: &Storage,
    query: &str,
    matches: &[SearchMatch],
    options: &ContextOptions,
) -> Result<ContextTree> {
    let node_ids: Vec<&str> = matches.iter().map(|m| m.node_id.as_str()).collect();
    build_from_nodes(storage, query, &node_ids, options)
}

/// Build a context tree rooted at the given nodes, in order. Repeated ids
/// keep their first position.
pub fn build_from_nodes(
    storage: &Storage,
    query: &str,
    node_ids: &[&str],
    options: &ContextOptions,
) -> Result<ContextTree> {
    let mut tree = ContextTree {
        query: query.to_string(),
        ..Default::default()
    };

    let mut processed: HashSet<String> = HashSet::new();
    let mut roots: Vec<String> = Vec::new();
    for node_id in node_ids {
        if processed.insert(node_id.to_string()) {
            roots.push(node_id.to_string());
        }
    }

    tree.children = expand(storage, &roots, options.depth, &mut processed)?;

    if options.include_related && !roots.is_empty() {
        let traversal = Traversal::new(options.depth).with_direction(options.direction);
        for related in traversal.related(storage, &roots)? {
            if processed.insert(related.node.id.clone()) {
                tree.related.push(ContextNode {
                    node_id: related.node.id,
                    record: related.record,
                    via: None,
                    children: Vec::new(),
                });
            }
        }
    }

    debug!(
        query,
        roots = tree.children.len(),
        related = tree.related.len(),
        "context tree built"
    );
    Ok(tree)
}

/// A tree node before its children are nested under it
struct Slot {
    node_id: String,
    record: Record,
    via: Option<EdgeLink>,
    children: Vec<usize>,
}

/// Expand `roots` through outgoing edges, breadth-first, up to `depth`
/// levels. Each level claims all of its unvisited targets before the next
/// level starts. Nodes already in `processed` are skipped.
fn expand(
    storage: &Storage,
    roots: &[String],
    depth: usize,
    processed: &mut HashSet<String>,
) -> Result<Vec<ContextNode>> {
    let mut slots: Vec<Slot> = Vec::new();
    for node_id in roots {
        let node = storage.require_node(node_id)?;
        let record = storage.record_for_node(&node)?;
        slots.push(Slot {
            node_id: node.id,
            record,
            via: None,
            children: Vec::new(),
        });
    }

    let mut frontier: Vec<usize> = (0..slots.len()).collect();
    for level in 1..=depth {
        let mut next = Vec::new();
        for parent in frontier {
            let edges = storage.edges_from(&slots[parent].node_id)?;
            for edge in edges {
                if !processed.insert(edge.to_node_id.clone()) {
                    continue;
                }
                let node = storage.require_node(&edge.to_node_id)?;
                let record = storage.record_for_node(&node)?;
                let index = slots.len();
                slots.push(Slot {
                    node_id: node.id,
                    record,
                    via: Some(EdgeLink::from(&edge)),
                    children: Vec::new(),
                });
                slots[parent].children.push(index);
                next.push(index);
            }
        }
        debug!(level, added = next.len(), "context level expanded");
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    // Children always sit after their parent, so nesting back to front
    // finds every child already built.
    let mut built: Vec<Option<ContextNode>> = Vec::with_capacity(slots.len());
    built.resize_with(slots.len(), || None);
    for (index, slot) in slots.into_iter().enumerate().rev() {
        let children = slot
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(ContextNode {
            node_id: slot.node_id,
            record: slot.record,
            via: slot.via,
            children,
        });
    }
    Ok(built.into_iter().take(roots.len()).flatten().collect())
}

//! Groups - named collections of records
//!
//! A group is an ordinary record with its own node. Membership is two edges
//! written in one transaction:
//!
//! ```text
//! group  --has_member-->  member     (note: the member's role, if given)
//! member --member_of--->  group
//! ```
//!
//! The context tree follows outgoing edges, so the context of a group lists
//! its members, and one level further down the members' own attributes.

use serde::Serialize;
use tracing::info;

use super::context::{self, ContextOptions, ContextTree};
use super::error::{GraphError, Result};
use super::graph::{self, Edge, Node};
use super::record::{Record, RecordType};
use super::resolve::Candidate;
use super::search::{self, SearchQuery};
use super::storage::Storage;

pub const HAS_MEMBER: &str = "has_member";
pub const MEMBER_OF: &str = "member_of";

/// The edge pair written for one membership
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub has_member: Edge,
    pub member_of: Edge,
}

/// A member as seen from its group
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub node: Node,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

fn require_group(group: &Node) -> Result<()> {
    if group.table_name != RecordType::Group.table_name() {
        return Err(GraphError::invalid(format!(
            "{} is not a group",
            group.record_id
        )));
    }
    Ok(())
}

/// Add `member` to `group`. A record joins a group at most once.
pub fn add_member(
    storage: &Storage,
    group: &Node,
    member: &Node,
    relationship: Option<&str>,
) -> Result<Membership> {
    require_group(group)?;
    if group.id == member.id {
        return Err(GraphError::invalid(format!(
            "group {} cannot contain itself",
            group.record_id
        )));
    }
    let already = storage
        .edges_from(&group.id)?
        .iter()
        .any(|e| e.edge_type == HAS_MEMBER && e.to_node_id == member.id);
    if already {
        return Err(GraphError::invalid(format!(
            "{} is already a member of {}",
            member.record_id, group.record_id
        )));
    }

    let tx = storage.conn().unchecked_transaction()?;
    let has_member = graph::create_edge(&tx, &group.id, &member.id, HAS_MEMBER, relationship)?;
    let member_of = graph::create_edge(&tx, &member.id, &group.id, MEMBER_OF, None)?;
    tx.commit()?;

    info!(
        group = %group.record_id,
        member = %member.record_id,
        relationship,
        "group member added"
    );
    Ok(Membership {
        has_member,
        member_of,
    })
}

/// Members of `group`, in the order they joined
pub fn members(storage: &Storage, group: &Node) -> Result<Vec<Member>> {
    require_group(group)?;
    let mut out = Vec::new();
    for edge in storage.edges_from(&group.id)? {
        if edge.edge_type != HAS_MEMBER {
            continue;
        }
        let node = storage.require_node(&edge.to_node_id)?;
        let record = storage.record_for_node(&node)?;
        out.push(Member {
            node,
            record,
            relationship: edge.searchable_content,
        });
    }
    Ok(out)
}

/// Context tree rooted at one group
pub fn context(storage: &Storage, group: &Node, options: &ContextOptions) -> Result<ContextTree> {
    require_group(group)?;
    context::build_from_nodes(storage, &group.record_id, &[group.id.as_str()], options)
}

/// Groups whose name or description match `text`, best first
pub fn search_groups(storage: &Storage, text: &str, limit: usize) -> Result<Vec<Candidate>> {
    let query = SearchQuery::new(text)
        .of_type(RecordType::Group)
        .with_limit(limit)
        .with_recent_limit(limit);
    let mut out = Vec::new();
    for hit in search::search(storage, &query)? {
        let node = storage.require_node(&hit.node_id)?;
        let record = storage.record_for_node(&node)?;
        out.push(Candidate { node, record });
    }
    Ok(out)
}

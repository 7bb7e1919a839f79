//! Reference resolution
//!
//! Commands that take a record reference (`link`, `attr --about`, `show`,
//! `group add`) accept either an exact id or free text. Free text goes through search, and
//! the caller decides what to do when several records match.

use serde::Serialize;

use super::error::{GraphError, Result};
use super::graph::Node;
use super::group;
use super::ids;
use super::record::{Record, RecordType};
use super::search::{self, SearchQuery};
use super::storage::Storage;

/// Most candidates offered for one reference
const MAX_CANDIDATES: usize = 10;

/// A record that a reference may point to
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub node: Node,
    pub record: Record,
}

/// Outcome of resolving a reference
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Candidate),
    Ambiguous(Vec<Candidate>),
    Missing,
}

impl Resolution {
    /// Best-ranked candidate, if any
    pub fn first(self) -> Option<Candidate> {
        match self {
            Resolution::Found(c) => Some(c),
            Resolution::Ambiguous(cs) => cs.into_iter().next(),
            Resolution::Missing => None,
        }
    }

    /// Exactly one candidate, or an error naming the reference
    pub fn require_unique(self, reference: &str) -> Result<Candidate> {
        match self {
            Resolution::Found(c) => Ok(c),
            Resolution::Ambiguous(cs) => Err(GraphError::AmbiguousMatch {
                reference: reference.to_string(),
                count: cs.len(),
            }),
            Resolution::Missing => Err(GraphError::not_found("Record", reference)),
        }
    }
}

impl From<Vec<Candidate>> for Resolution {
    fn from(mut candidates: Vec<Candidate>) -> Self {
        match candidates.len() {
            0 => Resolution::Missing,
            1 => Resolution::Found(candidates.remove(0)),
            _ => Resolution::Ambiguous(candidates),
        }
    }
}

/// Resolve a reference to candidate records.
///
/// An exact record id or node id wins outright. Otherwise node search results
/// are used, best first; edge matches are ignored.
pub fn resolve(storage: &Storage, reference: &str) -> Result<Resolution> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(GraphError::invalid("reference must not be empty"));
    }

    if ids::is_node_id(reference) {
        if let Some(node) = storage.get_node(reference)? {
            let record = storage.record_for_node(&node)?;
            return Ok(Resolution::Found(Candidate { node, record }));
        }
    }
    if let Some(record) = storage.find_record(reference)? {
        let node = storage.node_of(&record)?;
        return Ok(Resolution::Found(Candidate { node, record }));
    }

    let query = SearchQuery::new(reference)
        .with_limit(MAX_CANDIDATES)
        .nodes_only();
    let mut candidates = Vec::new();
    for m in search::search(storage, &query)? {
        let node = storage.require_node(&m.node_id)?;
        let record = storage.record_for_node(&node)?;
        candidates.push(Candidate { node, record });
    }

    Ok(Resolution::from(candidates))
}

/// Resolve a reference among groups only: a group id or node id, otherwise
/// a search over group names and descriptions
pub fn resolve_group(storage: &Storage, reference: &str) -> Result<Resolution> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(GraphError::invalid("reference must not be empty"));
    }

    let table = RecordType::Group.table_name();
    let node = match storage.node_for_record(table, reference)? {
        Some(node) => Some(node),
        None if ids::is_node_id(reference) => storage
            .get_node(reference)?
            .filter(|n| n.table_name == table),
        None => None,
    };
    if let Some(node) = node {
        let record = storage.record_for_node(&node)?;
        return Ok(Resolution::Found(Candidate { node, record }));
    }

    Ok(Resolution::from(group::search_groups(
        storage,
        reference,
        MAX_CANDIDATES,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordFields;
    use anyhow::Result;

    #[test]
    fn test_exact_id_wins() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("car"))?;
        storage.store(Some("T2"), RecordFields::entity("T1 replica"))?;

        match resolve(&storage, "T1")? {
            Resolution::Found(c) => assert_eq!(c.record.id(), "T1"),
            other => panic!("unexpected {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_node_id_resolves() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("car"))?;
        let node = storage.node_for_record("entities", "T1")?.unwrap();

        let found = resolve(&storage, &node.id)?.require_unique(&node.id)?;
        assert_eq!(found.record.id(), "T1");
        Ok(())
    }

    #[test]
    fn test_text_match_single() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("red car"))?;
        storage.store(Some("T2"), RecordFields::entity("blue bike"))?;

        let found = resolve(&storage, "bike")?.require_unique("bike")?;
        assert_eq!(found.record.id(), "T2");
        Ok(())
    }

    #[test]
    fn test_ambiguous_and_missing() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("red car"))?;
        storage.store(Some("T2"), RecordFields::entity("blue car"))?;

        let resolution = resolve(&storage, "car")?;
        assert!(matches!(&resolution, Resolution::Ambiguous(cs) if cs.len() == 2));
        let err = resolution.clone().require_unique("car").unwrap_err();
        assert!(matches!(err, GraphError::AmbiguousMatch { count: 2, .. }));
        assert!(resolution.first().is_some());

        let missing = resolve(&storage, "zebra")?;
        assert!(missing.clone().first().is_none());
        assert!(missing.require_unique("zebra").unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn test_group_reference_ignores_other_records() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("fleet manager"))?;
        storage.store(Some("G1"), RecordFields::group("fleet"))?;

        assert!(matches!(resolve(&storage, "fleet")?, Resolution::Ambiguous(_)));
        let found = resolve_group(&storage, "fleet")?.require_unique("fleet")?;
        assert_eq!(found.record.id(), "G1");

        assert!(matches!(resolve_group(&storage, "T1")?, Resolution::Missing));
        let node = storage.node_for_record("groups", "G1")?.unwrap();
        let by_node = resolve_group(&storage, &node.id)?.require_unique(&node.id)?;
        assert_eq!(by_node.record.id(), "G1");
        Ok(())
    }

    #[test]
    fn test_empty_reference_rejected() -> Result<()> {
        let storage = Storage::open_memory()?;
        assert!(matches!(
            resolve(&storage, "  "),
            Err(GraphError::InvalidInput(_))
        ));
        Ok(())
    }
}

//! Search - Full-text search engine
//!
//! Uses SQLite FTS5 (porter stemming) with BM25 ranking over node and edge
//! searchable content.
//!
//! # Strategy
//! 1. Empty query: most recently created nodes
//! 2. Query equal to a record id (or node id): that record alone
//! 3. Full-text: every query token must match; ties broken by recency
//! 4. Substring (LIKE) fallback when the query has no indexable tokens or
//!    FTS5 rejects it
//!
//! A query restricted to one record type runs the same strategy over that
//! type's nodes only.

use chrono::{DateTime, Utc};
use rusqlite::params_from_iter;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{GraphError, Result};
use super::graph::{self, row_to_edge, row_to_node, Edge, Node};
use super::ids::{escape_like, is_node_id};
use super::record::RecordType;
use super::storage::Storage;

/// Search query builder
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text query
    pub text: String,

    /// Maximum results
    pub limit: usize,

    /// Results for an empty query
    pub recent_limit: usize,

    /// Also match edge content
    pub include_edges: bool,

    /// Only match nodes of this record type
    pub record_type: Option<RecordType>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 20,
            recent_limit: 10,
            include_edges: true,
            record_type: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit;
        self
    }

    pub fn nodes_only(mut self) -> Self {
        self.include_edges = false;
        self
    }

    /// Restrict matches to records of one type; edges never match
    pub fn of_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self.include_edges = false;
        self
    }

    fn table(&self) -> Option<&'static str> {
        self.record_type.map(RecordType::table_name)
    }

    fn searches_edges(&self) -> bool {
        self.include_edges && self.record_type.is_none()
    }
}

/// Where a match came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Node,
    Edge,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Node => "node",
            MatchSource::Edge => "edge",
        }
    }
}

/// Which search strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Id,
    FullText,
    Substring,
    Recent,
}

/// One ranked search hit
#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub source: MatchSource,
    /// Record table for node matches, edge type for edge matches
    pub kind: String,
    /// Record id for node matches, edge id for edge matches
    pub record_id: String,
    /// Matched node, or the source node of a matched edge
    pub node_id: String,
    pub content: String,
    /// BM25 score (lower is better); 0 outside full-text matching
    pub score: f64,
    pub matched_by: MatchedBy,
    #[serde(skip)]
    created_at: DateTime<Utc>,
}

impl SearchMatch {
    fn from_node(node: Node, score: f64, matched_by: MatchedBy) -> Self {
        Self {
            source: MatchSource::Node,
            kind: node.table_name,
            record_id: node.record_id,
            node_id: node.id,
            content: node.searchable_content,
            score,
            matched_by,
            created_at: node.created_at,
        }
    }

    fn from_edge(edge: Edge, score: f64, matched_by: MatchedBy) -> Self {
        Self {
            source: MatchSource::Edge,
            kind: edge.edge_type,
            record_id: edge.id,
            node_id: edge.from_node_id,
            content: edge.searchable_content.unwrap_or_default(),
            score,
            matched_by,
            created_at: edge.created_at,
        }
    }

    pub fn is_node(&self) -> bool {
        self.source == MatchSource::Node
    }
}

/// Execute a search query
pub fn search(storage: &Storage, query: &SearchQuery) -> Result<Vec<SearchMatch>> {
    let text = query.text.trim();

    if text.is_empty() {
        debug!(limit = query.recent_limit, "empty query, returning recent records");
        return recent(storage, query);
    }

    let exact = exact_id_match(storage, text)?
        .filter(|hit| query.table().map_or(true, |table| hit.kind == table));
    if let Some(hit) = exact {
        debug!(id = %hit.record_id, "exact id match");
        return Ok(vec![hit]);
    }

    let tokens = tokenize(text);
    if !tokens.is_empty() {
        match full_text(storage, &tokens, query) {
            Ok(matches) => {
                debug!(query = text, hits = matches.len(), "full-text search");
                return Ok(matches);
            }
            Err(GraphError::Storage(e)) => {
                warn!(error = %e, query = text, "FTS5 rejected query, using substring match");
            }
            Err(e) => return Err(e),
        }
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    substring(storage, &words, query)
}

/// Split a query into FTS5 string tokens.
///
/// Each word becomes a double-quoted string so operators (`AND`, `NOT`,
/// `NEAR`), column filters and stray quotes lose their meaning. Words without
/// any letter or digit are dropped because the tokenizer would discard them.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(|w| format!("\"{}\"", w.replace('"', "\"\"")))
        .collect()
}

fn exact_id_match(storage: &Storage, text: &str) -> Result<Option<SearchMatch>> {
    if let Some(record) = storage.find_record(text)? {
        let node = storage.node_of(&record)?;
        return Ok(Some(SearchMatch::from_node(node, 0.0, MatchedBy::Id)));
    }
    if is_node_id(text) {
        if let Some(node) = storage.get_node(text)? {
            return Ok(Some(SearchMatch::from_node(node, 0.0, MatchedBy::Id)));
        }
    }
    Ok(None)
}

fn recent(storage: &Storage, query: &SearchQuery) -> Result<Vec<SearchMatch>> {
    Ok(graph::recent_nodes(storage.conn(), query.table(), query.recent_limit)?
        .into_iter()
        .map(|n| SearchMatch::from_node(n, 0.0, MatchedBy::Recent))
        .collect())
}

fn full_text(storage: &Storage, tokens: &[String], query: &SearchQuery) -> Result<Vec<SearchMatch>> {
    // Space-separated strings: FTS5 implicit AND
    let fts_query = tokens.join(" ");
    let conn = storage.conn();
    let limit = query.limit as i64;

    let mut stmt = conn.prepare(
        r#"
        SELECT n.id, n.table_name, n.record_id, n.searchable_content, n.created_at,
               bm25(nodes_fts) AS score
        FROM nodes_fts
        JOIN nodes n ON n.rowid = nodes_fts.rowid
        WHERE nodes_fts MATCH ?1 AND (?3 IS NULL OR n.table_name = ?3)
        ORDER BY score, n.created_at DESC, n.rowid DESC
        LIMIT ?2
        "#,
    )?;
    let mut matches = stmt
        .query_map(rusqlite::params![fts_query, limit, query.table()], |row| {
            let score: f64 = row.get("score")?;
            Ok(SearchMatch::from_node(row_to_node(row)?, score, MatchedBy::FullText))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if query.searches_edges() {
        let mut stmt = conn.prepare(
            r#"
            SELECT e.id, e.from_node_id, e.to_node_id, e.edge_type, e.searchable_content,
                   e.created_at, bm25(edges_fts) AS score
            FROM edges_fts
            JOIN edges e ON e.rowid = edges_fts.rowid
            WHERE edges_fts MATCH ?1
            ORDER BY score, e.created_at DESC, e.rowid DESC
            LIMIT ?2
            "#,
        )?;
        let edges = stmt
            .query_map(rusqlite::params![fts_query, limit], |row| {
                let score: f64 = row.get("score")?;
                Ok(SearchMatch::from_edge(row_to_edge(row)?, score, MatchedBy::FullText))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        matches.extend(edges);
    }

    rank(&mut matches);
    matches.truncate(query.limit);
    Ok(matches)
}

fn substring(storage: &Storage, words: &[&str], query: &SearchQuery) -> Result<Vec<SearchMatch>> {
    debug!(?words, "substring search");
    let conn = storage.conn();
    let patterns: Vec<String> = words
        .iter()
        .map(|w| format!("%{}%", escape_like(w)))
        .collect();
    let conditions = (1..=patterns.len())
        .map(|i| format!("searchable_content LIKE ?{} ESCAPE '\\'", i))
        .collect::<Vec<_>>()
        .join(" AND ");
    let limit = query.limit as i64;

    let mut node_conditions = conditions.clone();
    let mut node_params = patterns.clone();
    if let Some(table) = query.table() {
        node_params.push(table.to_string());
        node_conditions.push_str(&format!(" AND table_name = ?{}", node_params.len()));
    }

    let sql = format!(
        "SELECT id, table_name, record_id, searchable_content, created_at FROM nodes \
         WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT {}",
        node_conditions, limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut matches = stmt
        .query_map(params_from_iter(node_params.iter()), |row| {
            Ok(SearchMatch::from_node(row_to_node(row)?, 0.0, MatchedBy::Substring))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if query.searches_edges() {
        let sql = format!(
            "SELECT id, from_node_id, to_node_id, edge_type, searchable_content, created_at FROM edges \
             WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT {}",
            conditions, limit
        );
        let mut stmt = conn.prepare(&sql)?;
        let edges = stmt
            .query_map(params_from_iter(patterns.iter()), |row| {
                Ok(SearchMatch::from_edge(row_to_edge(row)?, 0.0, MatchedBy::Substring))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        matches.extend(edges);
    }

    rank(&mut matches);
    matches.truncate(query.limit);
    Ok(matches)
}

/// Best score first, then newest. The sort is stable, so full ties keep
/// the SQL order (newest rowid first, nodes before edges).
fn rank(matches: &mut [SearchMatch]) {
    matches.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{AttributeType, RecordFields};
    use anyhow::Result;

    fn seeded() -> Result<Storage> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("car"))?;
        let car = storage.node_for_record("entities", "T1")?.unwrap();
        storage.store_attached(
            None,
            RecordFields::attribute(AttributeType::Fact, "color", "red"),
            &car,
            "has_attribute",
        )?;
        storage.store(Some("T2"), RecordFields::entity("running shoes"))?;
        Ok(storage)
    }

    #[test]
    fn test_search_finds_entity() -> Result<()> {
        let storage = seeded()?;
        let results = search(&storage, &SearchQuery::new("car"))?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record_id, "T1");
        assert_eq!(results[0].kind, "entities");
        assert_eq!(results[0].matched_by, MatchedBy::FullText);
        Ok(())
    }

    #[test]
    fn test_search_stems_tokens() -> Result<()> {
        let storage = seeded()?;
        let results = search(&storage, &SearchQuery::new("runs"))?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record_id, "T2");
        Ok(())
    }

    #[test]
    fn test_search_requires_all_tokens() -> Result<()> {
        let storage = seeded()?;
        assert!(search(&storage, &SearchQuery::new("color blue"))?.is_empty());
        assert_eq!(search(&storage, &SearchQuery::new("color red"))?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_exact_id_is_sole_match() -> Result<()> {
        let storage = seeded()?;
        storage.store(Some("T3"), RecordFields::entity("T2 spare parts"))?;

        let results = search(&storage, &SearchQuery::new("T2"))?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record_id, "T2");
        assert_eq!(results[0].matched_by, MatchedBy::Id);
        Ok(())
    }

    #[test]
    fn test_node_id_resolves_directly() -> Result<()> {
        let storage = seeded()?;
        let node = storage.node_for_record("entities", "T2")?.unwrap();
        let results = search(&storage, &SearchQuery::new(node.id.clone()))?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record_id, "T2");
        Ok(())
    }

    #[test]
    fn test_empty_query_returns_recent() -> Result<()> {
        let storage = seeded()?;
        let results = search(&storage, &SearchQuery::new("   ").with_recent_limit(2))?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record_id, "T2");
        assert!(results.iter().all(|m| m.matched_by == MatchedBy::Recent));
        Ok(())
    }

    #[test]
    fn test_special_characters_never_fail() -> Result<()> {
        let storage = seeded()?;
        for q in ["\"car", "car AND (", "NOT car", "col:car", "car*", "\"\"", "(((", "-"] {
            search(&storage, &SearchQuery::new(q))?;
        }
        let results = search(&storage, &SearchQuery::new("car AND ("))?;
        assert!(results.is_empty());
        Ok(())
    }

    #[test]
    fn test_punctuation_query_uses_substring() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("c++ / rust"))?;
        let results = search(&storage, &SearchQuery::new("/"))?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_by, MatchedBy::Substring);
        Ok(())
    }

    #[test]
    fn test_type_filter_limits_every_strategy() -> Result<()> {
        let storage = seeded()?;
        storage.store(Some("G1"), RecordFields::group("car club"))?;
        let groups = |text: &str| SearchQuery::new(text).of_type(RecordType::Group);

        let hits = search(&storage, &groups("car"))?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record_id, "G1");

        assert!(search(&storage, &groups("T1"))?.is_empty());
        assert_eq!(search(&storage, &groups("G1"))?[0].matched_by, MatchedBy::Id);

        let recent = search(&storage, &groups(""))?;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].kind, "groups");
        Ok(())
    }

    #[test]
    fn test_edge_content_is_searchable() -> Result<()> {
        let storage = seeded()?;
        let car = storage.node_for_record("entities", "T1")?.unwrap();
        let shoes = storage.node_for_record("entities", "T2")?.unwrap();
        let edge = storage.create_edge(&car.id, &shoes.id, "references", Some("glovebox spare pair"))?;

        let results = search(&storage, &SearchQuery::new("glovebox"))?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, MatchSource::Edge);
        assert_eq!(results[0].record_id, edge.id);
        assert_eq!(results[0].node_id, car.id);

        let nodes_only = search(&storage, &SearchQuery::new("glovebox").nodes_only())?;
        assert!(nodes_only.is_empty());
        Ok(())
    }

    #[test]
    fn test_ties_broken_by_recency() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("apple"))?;
        storage.store(Some("T2"), RecordFields::entity("apple"))?;

        let first = search(&storage, &SearchQuery::new("apple"))?;
        let second = search(&storage, &SearchQuery::new("apple"))?;
        let ids: Vec<_> = first.iter().map(|m| m.record_id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1"]);
        let again: Vec<_> = second.iter().map(|m| m.record_id.as_str()).collect();
        assert_eq!(ids, again);
        Ok(())
    }

    #[test]
    fn test_limit_applies() -> Result<()> {
        let storage = Storage::open_memory()?;
        for i in 0..5 {
            storage.store(None, RecordFields::entity(format!("widget {}", i)))?;
        }
        let results = search(&storage, &SearchQuery::new("widget").with_limit(3))?;
        assert_eq!(results.len(), 3);
        Ok(())
    }
}

//! Graph index - nodes and edges
//!
//! Every record has exactly one node, created in the same transaction as the
//! record. Edges connect nodes regardless of the record types behind them.
//! Several edges may join the same pair of nodes and cycles are allowed.
//!
//! The functions here take a plain `&Connection` so they run equally inside
//! a `Transaction` (which derefs to `Connection`) or outside one.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::error::{GraphError, Result};
use super::ids;
use super::record::{self, Record};

/// Graph shadow of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Record store table that owns this node
    pub table_name: String,
    pub record_id: String,
    pub searchable_content: String,
    pub created_at: DateTime<Utc>,
}

/// Directed, typed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub edge_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// The endpoint opposite `node_id`
    pub fn other_end(&self, node_id: &str) -> &str {
        if self.from_node_id == node_id {
            &self.to_node_id
        } else {
            &self.from_node_id
        }
    }
}

/// Which edges to follow when walking the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Outgoing and incoming edges: relationships are symmetric
    #[default]
    Both,
    /// Outgoing edges only
    Outgoing,
}

/// Timestamp with fixed precision so text ordering matches time ordering
pub(crate) fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision it is stored with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Wrap a value that was read fine but does not parse as a column error
pub(crate) fn conversion_error<E>(row: &Row, column: &str, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    match row.as_ref().column_index(column) {
        Ok(index) => rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(err),
        ),
        Err(e) => e,
    }
}

fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, column, e))
}

/// Create the node for a freshly stored record
pub fn create_node(
    conn: &Connection,
    table_name: &str,
    record_id: &str,
    record: &Record,
) -> Result<Node> {
    let searchable_content = record::searchable_content(table_name, record)?;
    let id = ids::allocate_random(conn, "nodes", ids::node_id)?;
    let created_at = now();

    conn.execute(
        r#"
        INSERT INTO nodes (id, table_name, record_id, searchable_content, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            id,
            table_name,
            record_id,
            searchable_content,
            format_timestamp(created_at)
        ],
    )?;

    Ok(Node {
        id,
        table_name: table_name.to_string(),
        record_id: record_id.to_string(),
        searchable_content,
        created_at,
    })
}

/// Create an edge between two existing nodes
pub fn create_edge(
    conn: &Connection,
    from_node_id: &str,
    to_node_id: &str,
    edge_type: &str,
    content: Option<&str>,
) -> Result<Edge> {
    let edge_type = edge_type.trim();
    if edge_type.is_empty() {
        return Err(GraphError::invalid("edge type is required"));
    }
    for node_id in [from_node_id, to_node_id] {
        if get_node(conn, node_id)?.is_none() {
            return Err(GraphError::DanglingReference(node_id.to_string()));
        }
    }

    let content = content.map(str::trim).filter(|c| !c.is_empty());
    let id = ids::allocate_random(conn, "edges", ids::edge_id)?;
    let created_at = now();

    conn.execute(
        r#"
        INSERT INTO edges (id, from_node_id, to_node_id, edge_type, searchable_content, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            id,
            from_node_id,
            to_node_id,
            edge_type,
            content,
            format_timestamp(created_at)
        ],
    )?;

    Ok(Edge {
        id,
        from_node_id: from_node_id.to_string(),
        to_node_id: to_node_id.to_string(),
        edge_type: edge_type.to_string(),
        searchable_content: content.map(str::to_string),
        created_at,
    })
}

const NODE_COLUMNS: &str = "id, table_name, record_id, searchable_content, created_at";
const EDGE_COLUMNS: &str =
    "id, from_node_id, to_node_id, edge_type, searchable_content, created_at";

pub fn get_node(conn: &Connection, node_id: &str) -> Result<Option<Node>> {
    let sql = format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS);
    Ok(conn
        .query_row(&sql, params![node_id], row_to_node)
        .optional()?)
}

/// Reverse lookup from a typed record to its node
pub fn node_for_record(conn: &Connection, table_name: &str, record_id: &str) -> Result<Option<Node>> {
    let sql = format!(
        "SELECT {} FROM nodes WHERE table_name = ?1 AND record_id = ?2",
        NODE_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![table_name, record_id], row_to_node)
        .optional()?)
}

pub fn get_edge(conn: &Connection, edge_id: &str) -> Result<Option<Edge>> {
    let sql = format!("SELECT {} FROM edges WHERE id = ?1", EDGE_COLUMNS);
    Ok(conn
        .query_row(&sql, params![edge_id], row_to_edge)
        .optional()?)
}

/// Outgoing edges, oldest first
pub fn edges_from(conn: &Connection, node_id: &str) -> Result<Vec<Edge>> {
    edges_where(conn, "from_node_id", node_id)
}

/// Incoming edges, oldest first
pub fn edges_to(conn: &Connection, node_id: &str) -> Result<Vec<Edge>> {
    edges_where(conn, "to_node_id", node_id)
}

fn edges_where(conn: &Connection, column: &str, node_id: &str) -> Result<Vec<Edge>> {
    let sql = format!(
        "SELECT {} FROM edges WHERE {} = ?1 ORDER BY created_at, rowid",
        EDGE_COLUMNS, column
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let edges = stmt
        .query_map(params![node_id], row_to_edge)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(edges)
}

/// Edges incident to `node_id` in `direction`, each paired with the node at
/// the other end. Outgoing edges come first.
pub fn neighbors(
    conn: &Connection,
    node_id: &str,
    direction: Direction,
) -> Result<Vec<(Edge, String)>> {
    let mut out: Vec<(Edge, String)> = edges_from(conn, node_id)?
        .into_iter()
        .map(|e| {
            let other = e.to_node_id.clone();
            (e, other)
        })
        .collect();

    if direction == Direction::Both {
        out.extend(edges_to(conn, node_id)?.into_iter().map(|e| {
            let other = e.from_node_id.clone();
            (e, other)
        }));
    }

    Ok(out)
}

/// Most recently created nodes first
pub fn recent_nodes(conn: &Connection, table_name: Option<&str>, limit: usize) -> Result<Vec<Node>> {
    let sql = format!(
        "SELECT {} FROM nodes WHERE ?2 IS NULL OR table_name = ?2 \
         ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        NODE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let nodes = stmt
        .query_map(params![limit as i64, table_name], row_to_node)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(nodes)
}

pub(crate) fn row_to_node(row: &Row) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get("id")?,
        table_name: row.get("table_name")?,
        record_id: row.get("record_id")?,
        searchable_content: row.get("searchable_content")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

pub(crate) fn row_to_edge(row: &Row) -> rusqlite::Result<Edge> {
    Ok(Edge {
        id: row.get("id")?,
        from_node_id: row.get("from_node_id")?,
        to_node_id: row.get("to_node_id")?,
        edge_type: row.get("edge_type")?,
        searchable_content: row.get("searchable_content")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordFields;
    use crate::core::storage::Storage;

    #[test]
    fn test_create_node_rejects_unknown_table() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        let record = RecordFields::entity("car").into_record("T1".into());

        let err = create_node(storage.conn(), "notes", "T1", &record).unwrap_err();
        assert!(matches!(err, GraphError::UnregisteredType(t) if t == "notes"));
        Ok(())
    }

    #[test]
    fn test_neighbors_respects_direction() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("car"))?;
        storage.store(Some("T2"), RecordFields::entity("wheel"))?;
        let car = storage.node_for_record("entities", "T1")?.unwrap();
        let wheel = storage.node_for_record("entities", "T2")?.unwrap();
        storage.create_edge(&car.id, &wheel.id, "has_part", None)?;

        let out = neighbors(storage.conn(), &wheel.id, Direction::Outgoing)?;
        assert!(out.is_empty());

        let both = neighbors(storage.conn(), &wheel.id, Direction::Both)?;
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].1, car.id);
        assert_eq!(both[0].0.other_end(&wheel.id), car.id);
        Ok(())
    }

    #[test]
    fn test_edges_ordered_oldest_first() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("a"))?;
        storage.store(Some("T2"), RecordFields::entity("b"))?;
        let a = storage.node_for_record("entities", "T1")?.unwrap();
        let b = storage.node_for_record("entities", "T2")?.unwrap();

        let first = storage.create_edge(&a.id, &b.id, "references", None)?;
        let second = storage.create_edge(&a.id, &b.id, "depends_on", Some("build order"))?;

        let edges = edges_from(storage.conn(), &a.id)?;
        let ids: Vec<_> = edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
        assert_eq!(edges[1].searchable_content.as_deref(), Some("build order"));
        Ok(())
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() -> anyhow::Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), RecordFields::entity("car"))?;
        storage.store(Some("T2"), RecordFields::entity("wheel"))?;
        let node = storage.node_for_record("entities", "T1")?.unwrap();
        let wheel = storage.node_for_record("entities", "T2")?.unwrap();

        let edge = storage.create_edge(&node.id, &wheel.id, "has_part", None)?;
        assert_eq!(storage.get_edge(&edge.id)?.unwrap(), edge);

        storage.conn().execute(
            "UPDATE nodes SET created_at = 'yesterday' WHERE id = ?1",
            params![node.id],
        )?;
        assert!(matches!(
            storage.get_node(&node.id),
            Err(GraphError::Storage(rusqlite::Error::FromSqlConversionFailure(..)))
        ));
        Ok(())
    }
}

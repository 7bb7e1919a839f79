//! Identifier allocation
//!
//! - Entities, files and groups: prefixed counters (`T1`, `T2`, ... / `F1` / `G1`)
//! - Nodes: `N-` plus 8 random hex digits
//! - Edges: `E-` plus 8 random hex digits
//! - Attributes: parent record id plus 8 random hex digits (`T1-0f3a9b2c`)
//!
//! Random suffixes come from the random half of a fresh ULID. Every candidate
//! is checked against its table before use.

use rusqlite::{params, Connection, OptionalExtension};
use ulid::Ulid;

use super::error::{GraphError, Result};

pub const NODE_PREFIX: &str = "N";
pub const EDGE_PREFIX: &str = "E";

/// Parent part of an attribute id when the attribute has no parent record
pub const ORPHAN_ATTRIBUTE_PARENT: &str = "A";

const MAX_ATTEMPTS: usize = 16;

/// 8 lowercase hex digits
pub fn random_hex() -> String {
    format!("{:08x}", Ulid::new().random() as u32)
}

pub fn node_id() -> String {
    format!("{}-{}", NODE_PREFIX, random_hex())
}

pub fn edge_id() -> String {
    format!("{}-{}", EDGE_PREFIX, random_hex())
}

pub fn attribute_id(parent_id: &str) -> String {
    format!("{}-{}", parent_id, random_hex())
}

/// True if `id` looks like a node id (`N-` + 8 hex digits)
pub fn is_node_id(id: &str) -> bool {
    id.strip_prefix("N-")
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn id_exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    let found = conn
        .query_row(&sql, params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Generate candidates with `make` until one is unused in `table`
pub fn allocate_random(
    conn: &Connection,
    table: &str,
    make: impl Fn() -> String,
) -> Result<String> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = make();
        if !id_exists(conn, table, &candidate)? {
            return Ok(candidate);
        }
        tracing::debug!(%table, %candidate, "id collision, retrying");
    }
    Err(GraphError::invalid(format!(
        "could not allocate a free id in {} after {} attempts",
        table, MAX_ATTEMPTS
    )))
}

/// Next counter id for `prefix` in `table`: one past the highest numeric
/// suffix already used, starting at 1
pub fn allocate_sequential(conn: &Connection, table: &str, prefix: &str) -> Result<String> {
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GraphError::invalid(format!("invalid id prefix '{}'", prefix)));
    }

    let pattern = format!("{}%", escape_like(prefix));
    let sql = format!("SELECT id FROM {} WHERE id LIKE ?1 ESCAPE '\\'", table);
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params![pattern], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let max = ids
        .iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    let next = max.checked_add(1).ok_or_else(|| {
        GraphError::invalid(format!(
            "{} ids are exhausted: {}{} is the largest counter",
            prefix, prefix, max
        ))
    })?;
    Ok(format!("{}{}", prefix, next))
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

//! Storage - SQLite backend
//!
//! One database file holds the record tables (`entities`, `attributes`,
//! `files`, `groups`), the graph tables (`nodes`, `edges`) and FTS5 indexes over the
//! searchable content of nodes and edges.
//!
//! # Key Points
//! - Schema is created once, when the storage is opened
//! - Each mutation (record + node, optional attaching edge, or a lone edge)
//!   commits as a single transaction; a failure rolls back every row
//! - Records are never updated or deleted; triggers still keep the FTS
//!   indexes in sync for all three kinds of change

use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{GraphError, Result};
use super::graph::{self, Direction, Edge, Node};
use super::ids;
use super::record::{
    parse_due, Attribute, AttributeType, Entity, File, Group, Record, RecordFields, RecordType,
};

/// Prefixes for counter-based record ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPrefixes {
    pub entity: String,
    pub file: String,
    pub group: String,
}

impl Default for IdPrefixes {
    fn default() -> Self {
        Self {
            entity: "T".to_string(),
            file: "F".to_string(),
            group: "G".to_string(),
        }
    }
}

/// Database storage
pub struct Storage {
    conn: Connection,
    path: Option<PathBuf>,
    prefixes: IdPrefixes,
}

impl Storage {
    /// Open or create a database
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let storage = Self {
            conn,
            path: Some(path.to_path_buf()),
            prefixes: IdPrefixes::default(),
        };
        storage.init_schema()?;
        debug!(path = %path.display(), "storage opened");

        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn,
            path: None,
            prefixes: IdPrefixes::default(),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Use custom prefixes for generated entity/file ids
    pub fn with_id_prefixes(mut self, prefixes: IdPrefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Graph nodes: one per record
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                table_name TEXT NOT NULL,
                record_id TEXT NOT NULL,
                searchable_content TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                UNIQUE (table_name, record_id)
            );

            -- Directed edges; several per node pair are allowed
            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                from_node_id TEXT NOT NULL REFERENCES nodes(id),
                to_node_id TEXT NOT NULL REFERENCES nodes(id),
                edge_type TEXT NOT NULL,
                searchable_content TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_node_id);
            CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_node_id);
            CREATE INDEX IF NOT EXISTS idx_nodes_created ON nodes(created_at);

            -- Record tables
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                short_name TEXT,
                node_id TEXT NOT NULL UNIQUE REFERENCES nodes(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS attributes (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                subject TEXT NOT NULL,
                detail TEXT NOT NULL,
                due TEXT,
                node_id TEXT NOT NULL UNIQUE REFERENCES nodes(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL,
                description TEXT,
                content TEXT,
                include_content INTEGER NOT NULL DEFAULT 0,
                node_id TEXT NOT NULL UNIQUE REFERENCES nodes(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                node_id TEXT NOT NULL UNIQUE REFERENCES nodes(id),
                created_at TEXT NOT NULL
            );

            -- Full-text indexes, porter stemming so "runs" finds "running"
            CREATE VIRTUAL TABLE IF NOT EXISTS nodes_fts USING fts5(
                searchable_content,
                content='nodes',
                content_rowid='rowid',
                tokenize='porter unicode61'
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS edges_fts USING fts5(
                searchable_content,
                content='edges',
                content_rowid='rowid',
                tokenize='porter unicode61'
            );

            -- Triggers to keep FTS in sync
            CREATE TRIGGER IF NOT EXISTS nodes_ai AFTER INSERT ON nodes BEGIN
                INSERT INTO nodes_fts(rowid, searchable_content)
                VALUES (new.rowid, new.searchable_content);
            END;
            CREATE TRIGGER IF NOT EXISTS nodes_ad AFTER DELETE ON nodes BEGIN
                INSERT INTO nodes_fts(nodes_fts, rowid, searchable_content)
                VALUES ('delete', old.rowid, old.searchable_content);
            END;
            CREATE TRIGGER IF NOT EXISTS nodes_au AFTER UPDATE ON nodes BEGIN
                INSERT INTO nodes_fts(nodes_fts, rowid, searchable_content)
                VALUES ('delete', old.rowid, old.searchable_content);
                INSERT INTO nodes_fts(rowid, searchable_content)
                VALUES (new.rowid, new.searchable_content);
            END;

            CREATE TRIGGER IF NOT EXISTS edges_ai AFTER INSERT ON edges BEGIN
                INSERT INTO edges_fts(rowid, searchable_content)
                VALUES (new.rowid, new.searchable_content);
            END;
            CREATE TRIGGER IF NOT EXISTS edges_ad AFTER DELETE ON edges BEGIN
                INSERT INTO edges_fts(edges_fts, rowid, searchable_content)
                VALUES ('delete', old.rowid, old.searchable_content);
            END;
            CREATE TRIGGER IF NOT EXISTS edges_au AFTER UPDATE ON edges BEGIN
                INSERT INTO edges_fts(edges_fts, rowid, searchable_content)
                VALUES ('delete', old.rowid, old.searchable_content);
                INSERT INTO edges_fts(rowid, searchable_content)
                VALUES (new.rowid, new.searchable_content);
            END;
            "#,
        )?;

        Ok(())
    }

    // ========== Record store ==========

    /// Store a record and its node. Returns the resolved record id.
    ///
    /// Without `id`, entities, files and groups get the next counter id for
    /// their prefix and attributes get `A-<hex>`.
    pub fn store(&self, id: Option<&str>, fields: RecordFields) -> Result<String> {
        self.store_inner(id, fields, None)
    }

    /// Store a record, its node, and an edge `parent -> new node` of
    /// `edge_type`, all in one transaction. Attribute ids derive from the
    /// parent's record id.
    pub fn store_attached(
        &self,
        id: Option<&str>,
        fields: RecordFields,
        parent: &Node,
        edge_type: &str,
    ) -> Result<String> {
        self.store_inner(id, fields, Some((parent, edge_type)))
    }

    fn store_inner(
        &self,
        id: Option<&str>,
        fields: RecordFields,
        parent: Option<(&Node, &str)>,
    ) -> Result<String> {
        fields.validate()?;
        let record_type = fields.record_type();
        let table = record_type.table_name();

        // Dropping `tx` without commit rolls back every row written below
        let tx = self.conn.unchecked_transaction()?;

        let id = match id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => {
                validate_record_id(id)?;
                if record_exists(&tx, table, id)? {
                    return Err(GraphError::DuplicateIdentifier {
                        record_type: record_type.to_string(),
                        id: id.to_string(),
                    });
                }
                id.to_string()
            }
            None => self.allocate_record_id(&tx, record_type, parent.map(|(p, _)| p))?,
        };

        let record = fields.into_record(id.clone());
        let node = graph::create_node(&tx, table, &id, &record)?;
        insert_record(&tx, &record, &node.id)?;

        if let Some((parent, edge_type)) = parent {
            graph::create_edge(&tx, &parent.id, &node.id, edge_type, None)?;
        }

        tx.commit()?;
        info!(record_type = record_type.name(), %id, node_id = %node.id, "record stored");

        Ok(id)
    }

    fn allocate_record_id(
        &self,
        conn: &Connection,
        record_type: RecordType,
        parent: Option<&Node>,
    ) -> Result<String> {
        let table = record_type.table_name();
        match record_type {
            RecordType::Entity => ids::allocate_sequential(conn, table, &self.prefixes.entity),
            RecordType::File => ids::allocate_sequential(conn, table, &self.prefixes.file),
            RecordType::Group => ids::allocate_sequential(conn, table, &self.prefixes.group),
            RecordType::Attribute => {
                let parent_id = parent
                    .map(|p| p.record_id.as_str())
                    .unwrap_or(ids::ORPHAN_ATTRIBUTE_PARENT);
                ids::allocate_random(conn, table, || ids::attribute_id(parent_id))
            }
        }
    }

    /// Get a record by type and id
    pub fn get(&self, record_type: RecordType, id: &str) -> Result<Record> {
        get_record(&self.conn, record_type, id)?
            .ok_or_else(|| GraphError::not_found(record_type.to_string(), id))
    }

    /// Find a record by id across all record types, in registry order
    pub fn find_record(&self, id: &str) -> Result<Option<Record>> {
        for record_type in RecordType::ALL {
            if let Some(record) = get_record(&self.conn, record_type, id)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Resolve a node to the record that owns it
    pub fn record_for_node(&self, node: &Node) -> Result<Record> {
        let record_type = RecordType::from_table_name(&node.table_name)?;
        self.get(record_type, &node.record_id)
    }

    // ========== Graph index ==========

    /// Create an edge between two existing nodes
    pub fn create_edge(
        &self,
        from_node_id: &str,
        to_node_id: &str,
        edge_type: &str,
        content: Option<&str>,
    ) -> Result<Edge> {
        let tx = self.conn.unchecked_transaction()?;
        let edge = graph::create_edge(&tx, from_node_id, to_node_id, edge_type, content)?;
        tx.commit()?;
        info!(edge_id = %edge.id, from = from_node_id, to = to_node_id, edge_type = %edge.edge_type, "edge created");
        Ok(edge)
    }

    pub fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        graph::get_node(&self.conn, node_id)
    }

    /// Like [`Storage::get_node`], but a missing node is an error
    pub fn require_node(&self, node_id: &str) -> Result<Node> {
        self.get_node(node_id)?
            .ok_or_else(|| GraphError::not_found("Node", node_id))
    }

    pub fn get_edge(&self, edge_id: &str) -> Result<Option<Edge>> {
        graph::get_edge(&self.conn, edge_id)
    }

    pub fn edges_from(&self, node_id: &str) -> Result<Vec<Edge>> {
        graph::edges_from(&self.conn, node_id)
    }

    pub fn edges_to(&self, node_id: &str) -> Result<Vec<Edge>> {
        graph::edges_to(&self.conn, node_id)
    }

    pub fn neighbors(&self, node_id: &str, direction: Direction) -> Result<Vec<(Edge, String)>> {
        graph::neighbors(&self.conn, node_id, direction)
    }

    pub fn node_for_record(&self, table_name: &str, record_id: &str) -> Result<Option<Node>> {
        graph::node_for_record(&self.conn, table_name, record_id)
    }

    /// Node of a record; every stored record has one
    pub fn node_of(&self, record: &Record) -> Result<Node> {
        let table = record.record_type().table_name();
        self.node_for_record(table, record.id())?
            .ok_or_else(|| GraphError::not_found("Node for record", record.id()))
    }

    pub fn recent_nodes(&self, limit: usize) -> Result<Vec<Node>> {
        graph::recent_nodes(&self.conn, None, limit)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |table: &str| -> Result<usize> {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StorageStats {
            entities: count("entities")?,
            attributes: count("attributes")?,
            files: count("files")?,
            groups: count("groups")?,
            nodes: count("nodes")?,
            edges: count("edges")?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub entities: usize,
    pub attributes: usize,
    pub files: usize,
    pub groups: usize,
    pub nodes: usize,
    pub edges: usize,
}

impl StorageStats {
    pub fn records(&self) -> usize {
        self.entities + self.attributes + self.files + self.groups
    }
}

fn validate_record_id(id: &str) -> Result<()> {
    if id.chars().any(char::is_whitespace) {
        return Err(GraphError::invalid(format!(
            "record id '{}' must not contain whitespace",
            id
        )));
    }
    Ok(())
}

fn record_exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    Ok(conn
        .query_row(&sql, params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn insert_record(conn: &Connection, record: &Record, node_id: &str) -> Result<()> {
    let created_at = graph::now_timestamp();
    match record {
        Record::Entity(e) => conn.execute(
            "INSERT INTO entities (id, name, short_name, node_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![e.id, e.name, e.short_name, node_id, created_at],
        )?,
        Record::Attribute(a) => conn.execute(
            "INSERT INTO attributes (id, type, subject, detail, due, node_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                a.id,
                a.attr_type.as_str(),
                a.subject,
                a.detail,
                a.due.map(|d| d.to_string()),
                node_id,
                created_at
            ],
        )?,
        Record::File(f) => conn.execute(
            "INSERT INTO files (id, file_path, description, content, include_content, node_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                f.id,
                f.file_path,
                f.description,
                f.content,
                f.include_content,
                node_id,
                created_at
            ],
        )?,
        Record::Group(g) => conn.execute(
            "INSERT INTO groups (id, name, description, node_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![g.id, g.name, g.description, node_id, created_at],
        )?,
    };
    debug!(id = record.id(), node_id, "record row inserted");
    Ok(())
}

fn get_record(conn: &Connection, record_type: RecordType, id: &str) -> Result<Option<Record>> {
    let (sql, mapper): (&str, fn(&Row) -> rusqlite::Result<Record>) = match record_type {
        RecordType::Entity => (
            "SELECT id, name, short_name FROM entities WHERE id = ?1",
            row_to_entity,
        ),
        RecordType::Attribute => (
            "SELECT id, type, subject, detail, due FROM attributes WHERE id = ?1",
            row_to_attribute,
        ),
        RecordType::File => (
            "SELECT id, file_path, description, content, include_content FROM files WHERE id = ?1",
            row_to_file,
        ),
        RecordType::Group => (
            "SELECT id, name, description FROM groups WHERE id = ?1",
            row_to_group,
        ),
    };

    Ok(conn.query_row(sql, params![id], mapper).optional()?)
}

fn row_to_entity(row: &Row) -> rusqlite::Result<Record> {
    Ok(Record::Entity(Entity {
        id: row.get("id")?,
        name: row.get("name")?,
        short_name: row.get("short_name")?,
    }))
}

fn row_to_attribute(row: &Row) -> rusqlite::Result<Record> {
    let type_str: String = row.get("type")?;
    let attr_type = type_str
        .parse::<AttributeType>()
        .map_err(|e| graph::conversion_error(row, "type", e))?;
    let due_str: Option<String> = row.get("due")?;
    let due = due_str
        .map(|s| parse_due(&s))
        .transpose()
        .map_err(|e| graph::conversion_error(row, "due", e))?;
    Ok(Record::Attribute(Attribute {
        id: row.get("id")?,
        attr_type,
        subject: row.get("subject")?,
        detail: row.get("detail")?,
        due,
    }))
}

fn row_to_file(row: &Row) -> rusqlite::Result<Record> {
    Ok(Record::File(File {
        id: row.get("id")?,
        file_path: row.get("file_path")?,
        description: row.get("description")?,
        content: row.get("content")?,
        include_content: row.get("include_content")?,
    }))
}

fn row_to_group(row: &Row) -> rusqlite::Result<Record> {
    Ok(Record::Group(Group {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn entity(name: &str) -> RecordFields {
        RecordFields::entity(name)
    }

    #[test]
    fn test_store_and_get_round_trip() -> Result<()> {
        let storage = Storage::open_memory()?;

        let fields = RecordFields::Entity {
            name: "car".into(),
            short_name: Some("auto".into()),
        };
        let id = storage.store(Some("T1"), fields)?;
        assert_eq!(id, "T1");

        let record = storage.get(RecordType::Entity, "T1")?;
        assert_eq!(
            record,
            Record::Entity(Entity {
                id: "T1".into(),
                name: "car".into(),
                short_name: Some("auto".into()),
            })
        );

        Ok(())
    }

    #[test]
    fn test_store_creates_exactly_one_node() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), entity("car"))?;

        let node = storage.node_for_record("entities", "T1")?.unwrap();
        assert_eq!(node.record_id, "T1");
        assert_eq!(node.searchable_content, "car");
        assert!(ids::is_node_id(&node.id));

        let stats = storage.stats()?;
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.records(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_id_rejected_and_original_kept() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), entity("car"))?;

        let err = storage.store(Some("T1"), entity("boat")).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentifier { .. }));

        match storage.get(RecordType::Entity, "T1")? {
            Record::Entity(e) => assert_eq!(e.name, "car"),
            other => panic!("unexpected record {:?}", other),
        }
        assert_eq!(storage.stats()?.nodes, 1);
        Ok(())
    }

    #[test]
    fn test_generated_entity_ids_count_up() -> Result<()> {
        let storage = Storage::open_memory()?;
        assert_eq!(storage.store(None, entity("a"))?, "T1");
        assert_eq!(storage.store(None, entity("b"))?, "T2");
        storage.store(Some("T10"), entity("c"))?;
        assert_eq!(storage.store(None, entity("d"))?, "T11");
        assert_eq!(storage.store(None, RecordFields::file("a.md"))?, "F1");
        Ok(())
    }

    #[test]
    fn test_custom_prefixes() -> Result<()> {
        let storage = Storage::open_memory()?.with_id_prefixes(IdPrefixes {
            entity: "P".into(),
            file: "D".into(),
            group: "C".into(),
        });
        assert_eq!(storage.store(None, entity("a"))?, "P1");
        assert_eq!(storage.store(None, RecordFields::file("x"))?, "D1");
        assert_eq!(storage.store(None, RecordFields::group("crew"))?, "C1");
        Ok(())
    }

    #[test]
    fn test_store_attached_links_parent() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), entity("car"))?;
        let car = storage.node_for_record("entities", "T1")?.unwrap();

        let attr_id = storage.store_attached(
            None,
            RecordFields::attribute(AttributeType::Fact, "color", "red"),
            &car,
            "has_attribute",
        )?;
        assert!(attr_id.starts_with("T1-"));

        let edges = storage.edges_from(&car.id)?;
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, "has_attribute");

        let attr_node = storage.require_node(&edges[0].to_node_id)?;
        match storage.record_for_node(&attr_node)? {
            Record::Attribute(a) => {
                assert_eq!(a.id, attr_id);
                assert_eq!(a.subject, "color");
            }
            other => panic!("unexpected record {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_store_attached_rolls_back_on_missing_parent() -> Result<()> {
        let storage = Storage::open_memory()?;
        let ghost = Node {
            id: "N-00000000".into(),
            table_name: "entities".into(),
            record_id: "T9".into(),
            searchable_content: String::new(),
            created_at: chrono::Utc::now(),
        };

        let err = storage
            .store_attached(
                None,
                RecordFields::attribute(AttributeType::Fact, "color", "red"),
                &ghost,
                "has_attribute",
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference(_)));

        let stats = storage.stats()?;
        assert_eq!(stats.attributes, 0);
        assert_eq!(stats.nodes, 0);
        assert_eq!(stats.edges, 0);
        Ok(())
    }

    #[test]
    fn test_edge_to_missing_nodes_is_dangling() -> Result<()> {
        let storage = Storage::open_memory()?;
        let err = storage
            .create_edge("N-11111111", "N-22222222", "references", None)
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference(ref id) if id == "N-11111111"));
        assert_eq!(storage.stats()?.edges, 0);
        Ok(())
    }

    #[test]
    fn test_get_missing_is_not_found() -> Result<()> {
        let storage = Storage::open_memory()?;
        let err = storage.get(RecordType::File, "F1").unwrap_err();
        assert!(err.is_not_found());
        assert!(storage.find_record("F1")?.is_none());
        Ok(())
    }

    #[test]
    fn test_file_round_trip() -> Result<()> {
        let storage = Storage::open_memory()?;
        let id = storage.store(
            None,
            RecordFields::File {
                file_path: "docs/car.md".into(),
                description: Some("maintenance log".into()),
                content: Some("oil changed".into()),
                include_content: true,
            },
        )?;

        match storage.find_record(&id)? {
            Some(Record::File(f)) => {
                assert_eq!(f.file_path, "docs/car.md");
                assert_eq!(f.content.as_deref(), Some("oil changed"));
                assert!(f.include_content);
            }
            other => panic!("unexpected record {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_unreadable_attribute_columns_are_errors() -> Result<()> {
        let storage = Storage::open_memory()?;
        storage.store(Some("T1"), entity("car"))?;
        let car = storage.node_for_record("entities", "T1")?.unwrap();
        let id = storage.store_attached(
            None,
            RecordFields::attribute(AttributeType::Task, "oil", "change oil"),
            &car,
            "has_attribute",
        )?;

        storage
            .conn()
            .execute("UPDATE attributes SET type = 'NOTE' WHERE id = ?1", params![id])?;
        assert!(matches!(
            storage.get(RecordType::Attribute, &id),
            Err(GraphError::Storage(rusqlite::Error::FromSqlConversionFailure(..)))
        ));

        storage.conn().execute(
            "UPDATE attributes SET type = 'TASK', due = 'someday' WHERE id = ?1",
            params![id],
        )?;
        assert!(matches!(
            storage.get(RecordType::Attribute, &id),
            Err(GraphError::Storage(rusqlite::Error::FromSqlConversionFailure(..)))
        ));
        Ok(())
    }

    #[test]
    fn test_exhausted_counter_fails_without_storing() -> Result<()> {
        let storage = Storage::open_memory()?;
        let max_id = format!("T{}", u64::MAX);
        storage.store(Some(&max_id), entity("last"))?;

        let err = storage.store(None, entity("one more")).unwrap_err();
        assert!(matches!(err, GraphError::InvalidInput(_)));
        assert_eq!(storage.stats()?.entities, 1);
        assert_eq!(storage.stats()?.nodes, 1);
        Ok(())
    }

    #[test]
    fn test_id_with_whitespace_rejected() -> Result<()> {
        let storage = Storage::open_memory()?;
        let err = storage.store(Some("T 1"), entity("car")).unwrap_err();
        assert!(matches!(err, GraphError::InvalidInput(_)));
        Ok(())
    }

    #[test]
    fn test_open_file_database_persists() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bonnet.db");

        {
            let storage = Storage::open(&path)?;
            storage.store(Some("T1"), entity("car"))?;
        }

        let storage = Storage::open(&path)?;
        assert!(storage.find_record("T1")?.is_some());
        assert_eq!(storage.path(), Some(path.as_path()));
        Ok(())
    }
}

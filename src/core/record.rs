//! Record types and the record type registry
//!
//! Every record kind (entity, attribute, file, group) is described by one
//! [`RecordTypeConfig`] entry: its backing table, field lists and the builder
//! that derives the searchable content of its graph node.
//!
//! Adding a record kind means adding a [`RecordType`] variant, its registry
//! entry and a builder. Search and traversal work in node space and never
//! look at concrete record fields.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{GraphError, Result};

/// All supported record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Entity,
    Attribute,
    File,
    Group,
}

/// Closed set of attribute kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    Fact,
    Ref,
    Task,
    Rule,
}

impl AttributeType {
    pub const ALL: [AttributeType; 4] = [
        AttributeType::Fact,
        AttributeType::Ref,
        AttributeType::Task,
        AttributeType::Rule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::Fact => "FACT",
            AttributeType::Ref => "REF",
            AttributeType::Task => "TASK",
            AttributeType::Rule => "RULE",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        AttributeType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| {
                let valid: Vec<_> = AttributeType::ALL.iter().map(|t| t.as_str()).collect();
                GraphError::invalid(format!(
                    "unknown attribute type '{}' (valid: {})",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Derives a node's searchable content from its record.
/// Returns `None` when handed a record of another kind.
pub type SearchableBuilder = fn(&Record) -> Option<String>;

/// Registry entry for one record kind
pub struct RecordTypeConfig {
    pub record_type: RecordType,
    pub name: &'static str,
    pub table_name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub required_fields: &'static [&'static str],
    pub optional_fields: &'static [&'static str],
    pub searchable_fields: &'static [&'static str],
    /// Valid `type` values; empty for kinds without a type field
    pub valid_types: &'static [AttributeType],
    pub build_searchable: SearchableBuilder,
}

static RECORD_TYPES: [RecordTypeConfig; 4] = [
    RecordTypeConfig {
        record_type: RecordType::Entity,
        name: "entity",
        table_name: "entities",
        display_name: "Entity",
        description: "A knowledge entity (topic, concept, etc.)",
        required_fields: &["id", "name"],
        optional_fields: &["short_name"],
        searchable_fields: &["name", "short_name"],
        valid_types: &[],
        build_searchable: entity_searchable,
    },
    RecordTypeConfig {
        record_type: RecordType::Attribute,
        name: "attribute",
        table_name: "attributes",
        display_name: "Attribute",
        description: "An attribute of a record (fact, reference, task, rule)",
        required_fields: &["id", "type", "subject", "detail"],
        optional_fields: &["due"],
        searchable_fields: &["type", "subject", "detail", "due"],
        valid_types: &AttributeType::ALL,
        build_searchable: attribute_searchable,
    },
    RecordTypeConfig {
        record_type: RecordType::File,
        name: "file",
        table_name: "files",
        display_name: "File",
        description: "A file reference with optional content",
        required_fields: &["id", "file_path"],
        optional_fields: &["description", "content", "include_content"],
        searchable_fields: &["file_path", "description"],
        valid_types: &[],
        build_searchable: file_searchable,
    },
    RecordTypeConfig {
        record_type: RecordType::Group,
        name: "group",
        table_name: "groups",
        display_name: "Group",
        description: "A named collection of member records",
        required_fields: &["id", "name"],
        optional_fields: &["description"],
        searchable_fields: &["name", "description"],
        valid_types: &[],
        build_searchable: group_searchable,
    },
];

/// All registry entries, in registry order
pub fn registry() -> &'static [RecordTypeConfig] {
    &RECORD_TYPES
}

/// Look up the registry entry backing a table
pub fn config_for_table(table_name: &str) -> Result<&'static RecordTypeConfig> {
    RECORD_TYPES
        .iter()
        .find(|c| c.table_name == table_name)
        .ok_or_else(|| GraphError::UnregisteredType(table_name.to_string()))
}

/// Build searchable content for a record using the builder registered for
/// `table_name`
pub fn searchable_content(table_name: &str, record: &Record) -> Result<String> {
    let config = config_for_table(table_name)?;
    (config.build_searchable)(record).ok_or_else(|| {
        GraphError::invalid(format!(
            "{} record {} cannot be indexed as {}",
            record.record_type().name(),
            record.id(),
            table_name
        ))
    })
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::Entity,
        RecordType::Attribute,
        RecordType::File,
        RecordType::Group,
    ];

    pub fn config(self) -> &'static RecordTypeConfig {
        match self {
            RecordType::Entity => &RECORD_TYPES[0],
            RecordType::Attribute => &RECORD_TYPES[1],
            RecordType::File => &RECORD_TYPES[2],
            RecordType::Group => &RECORD_TYPES[3],
        }
    }

    pub fn name(self) -> &'static str {
        self.config().name
    }

    pub fn table_name(self) -> &'static str {
        self.config().table_name
    }

    pub fn from_table_name(table_name: &str) -> Result<Self> {
        config_for_table(table_name).map(|c| c.record_type)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().display_name)
    }
}

impl FromStr for RecordType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        RECORD_TYPES
            .iter()
            .find(|c| c.name == lower || c.table_name == lower)
            .map(|c| c.record_type)
            .ok_or_else(|| GraphError::UnregisteredType(s.to_string()))
    }
}

/// Join searchable field values with single spaces, skipping empty ones
fn join_searchable<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> String {
    values
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn entity_searchable(record: &Record) -> Option<String> {
    match record {
        Record::Entity(e) => Some(join_searchable([
            Some(e.name.as_str()),
            e.short_name.as_deref(),
        ])),
        _ => None,
    }
}

fn attribute_searchable(record: &Record) -> Option<String> {
    match record {
        Record::Attribute(a) => {
            let due = a.due.map(|d| d.to_string());
            Some(join_searchable([
                Some(a.attr_type.as_str()),
                Some(a.subject.as_str()),
                Some(a.detail.as_str()),
                due.as_deref(),
            ]))
        }
        _ => None,
    }
}

fn file_searchable(record: &Record) -> Option<String> {
    match record {
        Record::File(f) => Some(join_searchable([
            Some(f.file_path.as_str()),
            f.description.as_deref(),
        ])),
        _ => None,
    }
}

fn group_searchable(record: &Record) -> Option<String> {
    match record {
        Record::Group(g) => Some(join_searchable([
            Some(g.name.as_str()),
            g.description.as_deref(),
        ])),
        _ => None,
    }
}

/// A top-level named concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

/// A typed fact/reference/task/rule, attached to another record by an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub subject: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
}

/// A file reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Echo `content` when rendering context
    #[serde(default)]
    pub include_content: bool,
}

/// A named collection; members hang off it by `has_member` edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Any stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "lowercase")]
pub enum Record {
    Entity(Entity),
    Attribute(Attribute),
    File(File),
    Group(Group),
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Entity(e) => &e.id,
            Record::Attribute(a) => &a.id,
            Record::File(f) => &f.id,
            Record::Group(g) => &g.id,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Entity(_) => RecordType::Entity,
            Record::Attribute(_) => RecordType::Attribute,
            Record::File(_) => RecordType::File,
            Record::Group(_) => RecordType::Group,
        }
    }

    /// Searchable content derived by this record's own builder
    pub fn searchable_content(&self) -> String {
        (self.record_type().config().build_searchable)(self).unwrap_or_default()
    }

    /// Short one-line label for listings and prompts
    pub fn label(&self) -> String {
        match self {
            Record::Entity(e) => match &e.short_name {
                Some(short) => format!("{} ({})", e.name, short),
                None => e.name.clone(),
            },
            Record::Attribute(a) => format!("{} {}={}", a.attr_type, a.subject, a.detail),
            Record::File(f) => match &f.description {
                Some(desc) => format!("{} - {}", f.file_path, desc),
                None => f.file_path.clone(),
            },
            Record::Group(g) => match &g.description {
                Some(desc) => format!("{} - {}", g.name, desc),
                None => g.name.clone(),
            },
        }
    }
}

/// Type-specific fields of a record that is about to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFields {
    Entity {
        name: String,
        short_name: Option<String>,
    },
    Attribute {
        attr_type: AttributeType,
        subject: String,
        detail: String,
        due: Option<NaiveDate>,
    },
    File {
        file_path: String,
        description: Option<String>,
        content: Option<String>,
        include_content: bool,
    },
    Group {
        name: String,
        description: Option<String>,
    },
}

impl RecordFields {
    pub fn entity(name: impl Into<String>) -> Self {
        RecordFields::Entity {
            name: name.into(),
            short_name: None,
        }
    }

    pub fn attribute(
        attr_type: AttributeType,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        RecordFields::Attribute {
            attr_type,
            subject: subject.into(),
            detail: detail.into(),
            due: None,
        }
    }

    pub fn file(file_path: impl Into<String>) -> Self {
        RecordFields::File {
            file_path: file_path.into(),
            description: None,
            content: None,
            include_content: false,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        RecordFields::Group {
            name: name.into(),
            description: None,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            RecordFields::Entity { .. } => RecordType::Entity,
            RecordFields::Attribute { .. } => RecordType::Attribute,
            RecordFields::File { .. } => RecordType::File,
            RecordFields::Group { .. } => RecordType::Group,
        }
    }

    /// Check required fields and type-specific constraints
    pub fn validate(&self) -> Result<()> {
        let config = self.record_type().config();
        let require = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(GraphError::invalid(format!(
                    "{} field '{}' is required",
                    config.name, field
                )))
            } else {
                Ok(())
            }
        };

        match self {
            RecordFields::Entity { name, .. } => require("name", name.as_str()),
            RecordFields::Attribute {
                attr_type,
                subject,
                detail,
                due,
            } => {
                if !config.valid_types.contains(attr_type) {
                    return Err(GraphError::invalid(format!(
                        "attribute type {} is not registered",
                        attr_type
                    )));
                }
                if due.is_some() && *attr_type != AttributeType::Task {
                    return Err(GraphError::invalid(format!(
                        "only TASK attributes take a due date, not {}",
                        attr_type
                    )));
                }
                require("subject", subject.as_str())?;
                require("detail", detail.as_str())
            }
            RecordFields::File { file_path, .. } => require("file_path", file_path.as_str()),
            RecordFields::Group { name, .. } => require("name", name.as_str()),
        }
    }

    /// Attach an id and produce the record to persist
    pub fn into_record(self, id: String) -> Record {
        match self {
            RecordFields::Entity { name, short_name } => Record::Entity(Entity {
                id,
                name: name.trim().to_string(),
                short_name: non_empty(short_name),
            }),
            RecordFields::Attribute {
                attr_type,
                subject,
                detail,
                due,
            } => Record::Attribute(Attribute {
                id,
                attr_type,
                subject: subject.trim().to_string(),
                detail: detail.trim().to_string(),
                due,
            }),
            RecordFields::File {
                file_path,
                description,
                content,
                include_content,
            } => Record::File(File {
                id,
                file_path: file_path.trim().to_string(),
                description: non_empty(description),
                content: content.filter(|c| !c.is_empty()),
                include_content,
            }),
            RecordFields::Group { name, description } => Record::Group(Group {
                id,
                name: name.trim().to_string(),
                description: non_empty(description),
            }),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a `YYYY-MM-DD` due date
pub fn parse_due(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| GraphError::invalid(format!("invalid date '{}', expected YYYY-MM-DD", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_by_table() {
        assert_eq!(
            RecordType::from_table_name("entities").unwrap(),
            RecordType::Entity
        );
        assert_eq!(RecordType::Attribute.table_name(), "attributes");
        assert!(matches!(
            RecordType::from_table_name("notes"),
            Err(GraphError::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_registry_entries_cover_all_types() {
        for record_type in RecordType::ALL {
            assert_eq!(record_type.config().record_type, record_type);
        }
        assert_eq!(registry().len(), RecordType::ALL.len());
    }

    #[test]
    fn test_entity_searchable_skips_missing_short_name() {
        let record = RecordFields::entity("car").into_record("T1".into());
        assert_eq!(searchable_content("entities", &record).unwrap(), "car");

        let record = RecordFields::Entity {
            name: "Rust language".into(),
            short_name: Some("rust".into()),
        }
        .into_record("T2".into());
        assert_eq!(record.searchable_content(), "Rust language rust");
    }

    #[test]
    fn test_attribute_searchable_includes_type() {
        let mut fields = RecordFields::attribute(AttributeType::Task, "oil", "change oil");
        if let RecordFields::Attribute { due, .. } = &mut fields {
            *due = Some(parse_due("2024-05-01").unwrap());
        }
        let record = fields.into_record("T1-0a0b0c0d".into());
        assert_eq!(record.searchable_content(), "TASK oil change oil 2024-05-01");
    }

    #[test]
    fn test_file_searchable_excludes_content() {
        let record = RecordFields::File {
            file_path: "notes/car.md".into(),
            description: Some("".into()),
            content: Some("secret body".into()),
            include_content: true,
        }
        .into_record("F1".into());
        assert_eq!(record.searchable_content(), "notes/car.md");
    }

    #[test]
    fn test_group_searchable_and_label() {
        let record = RecordFields::Group {
            name: "Fleet".into(),
            description: Some("company cars".into()),
        }
        .into_record("G1".into());
        assert_eq!(searchable_content("groups", &record).unwrap(), "Fleet company cars");
        assert_eq!(record.label(), "Fleet - company cars");
        assert_eq!(RecordType::from_table_name("groups").unwrap(), RecordType::Group);
        assert!(RecordFields::group(" ").validate().is_err());
    }

    #[test]
    fn test_builder_rejects_mismatched_table() {
        let record = RecordFields::entity("car").into_record("T1".into());
        assert!(matches!(
            searchable_content("files", &record),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_attribute_type_parse() {
        assert_eq!("fact".parse::<AttributeType>().unwrap(), AttributeType::Fact);
        assert_eq!(" Rule ".parse::<AttributeType>().unwrap(), AttributeType::Rule);
        assert!("NOTE".parse::<AttributeType>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(RecordFields::entity("  ").validate().is_err());
        assert!(RecordFields::file("a.txt").validate().is_ok());

        let fields = RecordFields::Attribute {
            attr_type: AttributeType::Fact,
            subject: "color".into(),
            detail: "red".into(),
            due: Some(parse_due("2024-01-01").unwrap()),
        };
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_parse_due_rejects_garbage() {
        assert!(parse_due("tomorrow").is_err());
    }
}

//! Context tree rendering
//!
//! XML output nests one tag per record. Attributes use their type as the tag
//! name (`<fact>`, `<task>`, ...) with `subject` as an XML attribute and the
//! detail as text. File content is only emitted when the file asks for it.

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;

use crate::core::context::{ContextNode, ContextTree};
use crate::core::record::Record;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContextFormat {
    #[default]
    Xml,
    Json,
}

pub fn render(tree: &ContextTree, format: ContextFormat) -> Result<String> {
    match format {
        ContextFormat::Xml => Ok(to_xml(tree)),
        ContextFormat::Json => Ok(serde_json::to_string_pretty(tree)?),
    }
}

pub fn to_xml(tree: &ContextTree) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<context query=\"{}\">", escape(&tree.query));
    for child in &tree.children {
        write_node(&mut out, child, 1);
    }
    if !tree.related.is_empty() {
        out.push_str("  <related>\n");
        for node in &tree.related {
            write_node(&mut out, node, 2);
        }
        out.push_str("  </related>\n");
    }
    out.push_str("</context>");
    out
}

fn write_node(out: &mut String, node: &ContextNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let (tag, mut attrs, text) = describe(&node.record);

    if let Some(via) = &node.via {
        attrs.push(("edge", via.edge_type.clone()));
        if let Some(note) = &via.content {
            attrs.push(("note", note.clone()));
        }
    }

    let _ = write!(out, "{}<{}", indent, tag);
    for (name, value) in &attrs {
        let _ = write!(out, " {}=\"{}\"", name, escape(value));
    }

    match (text, node.children.is_empty()) {
        (None, true) => out.push_str("/>\n"),
        (Some(text), true) => {
            let _ = writeln!(out, ">{}</{}>", escape(&text), tag);
        }
        (text, false) => {
            out.push_str(">\n");
            if let Some(text) = text {
                let _ = writeln!(out, "{}  {}", indent, escape(&text));
            }
            for child in &node.children {
                write_node(out, child, depth + 1);
            }
            let _ = writeln!(out, "{}</{}>", indent, tag);
        }
    }
}

/// Tag name, XML attributes and text body for a record
fn describe(record: &Record) -> (String, Vec<(&'static str, String)>, Option<String>) {
    match record {
        Record::Entity(e) => {
            let mut attrs = vec![("id", e.id.clone()), ("name", e.name.clone())];
            if let Some(short) = &e.short_name {
                attrs.push(("short_name", short.clone()));
            }
            ("entity".to_string(), attrs, None)
        }
        Record::Attribute(a) => {
            let mut attrs = vec![("id", a.id.clone()), ("subject", a.subject.clone())];
            if let Some(due) = a.due {
                attrs.push(("due", due.to_string()));
            }
            (
                a.attr_type.as_str().to_lowercase(),
                attrs,
                Some(a.detail.clone()),
            )
        }
        Record::File(f) => {
            let mut attrs = vec![("id", f.id.clone()), ("path", f.file_path.clone())];
            if let Some(desc) = &f.description {
                attrs.push(("description", desc.clone()));
            }
            let body = if f.include_content {
                f.content.clone()
            } else {
                None
            };
            ("file".to_string(), attrs, body)
        }
        Record::Group(g) => {
            let mut attrs = vec![("id", g.id.clone()), ("name", g.name.clone())];
            if let Some(desc) = &g.description {
                attrs.push(("description", desc.clone()));
            }
            ("group".to_string(), attrs, None)
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::EdgeLink;
    use crate::core::record::{AttributeType, RecordFields};

    fn entity(id: &str, name: &str) -> Record {
        RecordFields::entity(name).into_record(id.to_string())
    }

    #[test]
    fn test_empty_tree() {
        let tree = ContextTree {
            query: "zebra".into(),
            ..Default::default()
        };
        assert_eq!(to_xml(&tree), "<context query=\"zebra\">\n</context>");
    }

    #[test]
    fn test_nested_attribute() {
        let attr = RecordFields::attribute(AttributeType::Fact, "color", "red")
            .into_record("T1-0000abcd".into());
        let tree = ContextTree {
            query: "car".into(),
            children: vec![ContextNode {
                node_id: "N-00000001".into(),
                record: entity("T1", "car"),
                via: None,
                children: vec![ContextNode {
                    node_id: "N-00000002".into(),
                    record: attr,
                    via: Some(EdgeLink {
                        edge_id: "E-00000001".into(),
                        edge_type: "has_attribute".into(),
                        content: None,
                    }),
                    children: vec![],
                }],
            }],
            related: vec![],
        };

        let xml = to_xml(&tree);
        assert!(xml.contains("  <entity id=\"T1\" name=\"car\">\n"));
        assert!(xml.contains(
            "    <fact id=\"T1-0000abcd\" subject=\"color\" edge=\"has_attribute\">red</fact>\n"
        ));
        assert!(xml.contains("  </entity>\n"));
    }

    #[test]
    fn test_escapes_markup() {
        let tree = ContextTree {
            query: "a<b".into(),
            children: vec![ContextNode {
                node_id: "N-00000001".into(),
                record: entity("T1", "Tom & \"Jerry\""),
                via: None,
                children: vec![],
            }],
            related: vec![],
        };

        let xml = to_xml(&tree);
        assert!(xml.starts_with("<context query=\"a&lt;b\">"));
        assert!(xml.contains("name=\"Tom &amp; &quot;Jerry&quot;\"/>"));
    }

    #[test]
    fn test_file_content_only_when_included() {
        let mut fields = RecordFields::file("notes.txt");
        if let RecordFields::File { content, .. } = &mut fields {
            *content = Some("secret body".into());
        }
        let hidden = fields.clone().into_record("F1".into());
        if let RecordFields::File {
            include_content, ..
        } = &mut fields
        {
            *include_content = true;
        }
        let shown = fields.into_record("F2".into());

        let node = |record: Record| ContextNode {
            node_id: "N-00000001".into(),
            record,
            via: None,
            children: vec![],
        };
        let tree = ContextTree {
            query: "notes".into(),
            children: vec![node(hidden), node(shown)],
            related: vec![],
        };

        let xml = to_xml(&tree);
        assert!(xml.contains("<file id=\"F1\" path=\"notes.txt\"/>"));
        assert!(xml.contains("<file id=\"F2\" path=\"notes.txt\">secret body</file>"));
    }

    #[test]
    fn test_group_tag() {
        let group = RecordFields::Group {
            name: "fleet".into(),
            description: Some("company cars".into()),
        }
        .into_record("G1".into());
        let tree = ContextTree {
            query: "fleet".into(),
            children: vec![ContextNode {
                node_id: "N-00000001".into(),
                record: group,
                via: None,
                children: vec![ContextNode {
                    node_id: "N-00000002".into(),
                    record: entity("T1", "sedan"),
                    via: Some(EdgeLink {
                        edge_id: "E-00000001".into(),
                        edge_type: "has_member".into(),
                        content: Some("pool car".into()),
                    }),
                    children: vec![],
                }],
            }],
            related: vec![],
        };

        let xml = to_xml(&tree);
        assert!(xml.contains("  <group id=\"G1\" name=\"fleet\" description=\"company cars\">\n"));
        assert!(xml.contains(
            "    <entity id=\"T1\" name=\"sedan\" edge=\"has_member\" note=\"pool car\"/>\n"
        ));
        assert!(xml.contains("  </group>\n"));
    }

    #[test]
    fn test_json_format() -> Result<()> {
        let tree = ContextTree {
            query: "car".into(),
            children: vec![ContextNode {
                node_id: "N-00000001".into(),
                record: entity("T1", "car"),
                via: None,
                children: vec![],
            }],
            related: vec![],
        };
        let json: serde_json::Value = serde_json::from_str(&render(&tree, ContextFormat::Json)?)?;
        assert_eq!(json["children"][0]["record"]["record_type"], "entity");
        assert_eq!(json["children"][0]["record"]["id"], "T1");
        Ok(())
    }
}

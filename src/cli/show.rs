//! `bonnet show` command
//!
//! Shows one record with its node and edges.
//!
//! # Usage
//! ```bash
//! bonnet show T1
//! bonnet show N-1a2b3c4d
//! bonnet show "red car"          # not an id: resolved through search
//! bonnet show T1 --json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use super::utils::{open_storage, pick};
use super::Globals;
use crate::core::graph::{Edge, Node};
use crate::core::record::Record;
use crate::core::storage::Storage;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record id, node id, or search text
    pub target: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Fail instead of choosing when the search matches several records
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    record: &'a Record,
    node: &'a Node,
    outgoing: &'a [Edge],
    incoming: &'a [Edge],
}

pub fn run(args: ShowArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    let (record, node) = match storage.find_record(&args.target)? {
        Some(record) => {
            let node = storage.node_of(&record)?;
            (record, node)
        }
        None => {
            debug!(reference = %args.target, "not a record id, resolving");
            let candidate = pick(storage, &args.target, args.strict, globals)?;
            (candidate.record, candidate.node)
        }
    };

    let outgoing = storage.edges_from(&node.id)?;
    let incoming = storage.edges_to(&node.id)?;

    if args.json {
        let output = ShowOutput {
            record: &record,
            node: &node,
            outgoing: &outgoing,
            incoming: &incoming,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_record(&record, &node);
    if !outgoing.is_empty() {
        println!("\n{}", "Outgoing:".bold());
        for edge in &outgoing {
            print_edge(storage, edge, &edge.to_node_id, "->");
        }
    }
    if !incoming.is_empty() {
        println!("\n{}", "Incoming:".bold());
        for edge in &incoming {
            print_edge(storage, edge, &edge.from_node_id, "<-");
        }
    }

    Ok(())
}

fn print_record(record: &Record, node: &Node) {
    println!(
        "{} {}",
        record.id().bold(),
        format!("[{}]", record.record_type()).as_str().dimmed()
    );
    match record {
        Record::Entity(e) => {
            println!("Name:        {}", e.name);
            if let Some(short) = &e.short_name {
                println!("Short name:  {}", short);
            }
        }
        Record::Attribute(a) => {
            println!("Type:        {}", a.attr_type);
            println!("Subject:     {}", a.subject);
            println!("Detail:      {}", a.detail);
            if let Some(due) = a.due {
                println!("Due:         {}", due);
            }
        }
        Record::File(f) => {
            println!("Path:        {}", f.file_path);
            if let Some(desc) = &f.description {
                println!("Description: {}", desc);
            }
            println!("In context:  {}", if f.include_content { "yes" } else { "no" });
            if let Some(content) = &f.content {
                println!("\n{}", content);
            }
        }
        Record::Group(g) => {
            println!("Name:        {}", g.name);
            if let Some(desc) = &g.description {
                println!("Description: {}", desc);
            }
        }
    }
    println!("Node:        {}", node.id);
    println!("Created:     {}", node.created_at.format("%Y-%m-%d %H:%M:%S"));
}

fn print_edge(storage: &Storage, edge: &Edge, other: &str, arrow: &str) {
    // A label is cosmetic; fall back to the bare node id
    let label = storage
        .get_node(other)
        .ok()
        .flatten()
        .map(|n| format!("{} ({})", n.record_id, n.searchable_content))
        .unwrap_or_else(|| other.to_string());

    match &edge.searchable_content {
        Some(note) => println!("  {} {} {}  {}", arrow, edge.edge_type.as_str().cyan(), label, note.as_str().dimmed()),
        None => println!("  {} {} {}", arrow, edge.edge_type.as_str().cyan(), label),
    }
}

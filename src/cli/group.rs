//! `bonnet group` command
//!
//! Groups collect records under one name. Members are linked with
//! `has_member` / `member_of` edges, so a group's context lists its members
//! and their attributes.
//!
//! # Usage
//! ```bash
//! bonnet group new "Fleet" --description "company cars" --member T1 --member T2
//! bonnet group add fleet "red car" --role "pool car"
//! bonnet group show fleet
//! bonnet group list car
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use super::render::{render, ContextFormat};
use super::utils::{open_storage, pick, pick_group};
use super::Globals;
use crate::core::context::ContextOptions;
use crate::core::group;
use crate::core::record::{Record, RecordFields, RecordType};

#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommands,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a group, optionally with initial members
    New {
        /// Group name
        name: String,

        /// Explicit id (default: next counter id)
        #[arg(long)]
        id: Option<String>,

        /// What the group is for
        #[arg(short, long)]
        description: Option<String>,

        /// Member to add (id or search text); repeatable
        #[arg(short, long = "member")]
        members: Vec<String>,

        /// Fail instead of choosing when a member matches several records
        #[arg(long)]
        strict: bool,
    },

    /// Add a record to a group
    Add {
        /// Group (id or search text)
        group: String,

        /// Record to add (id or search text)
        member: String,

        /// The member's role in the group
        #[arg(short, long)]
        role: Option<String>,

        /// Fail instead of choosing when a reference matches several records
        #[arg(long)]
        strict: bool,
    },

    /// Render a group with its members
    Show {
        /// Group (id or search text)
        group: String,

        /// Edges to follow below the group
        #[arg(short, long, default_value_t = 2)]
        depth: usize,

        /// Fail instead of choosing when the group matches several records
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "xml")]
        format: ContextFormat,
    },

    /// List groups, optionally filtered by name or description
    List {
        /// Search text (empty: most recent groups)
        #[arg(default_value = "")]
        query: String,

        /// Maximum groups (default: search.default_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(args: GroupArgs, globals: &Globals) -> Result<()> {
    match args.command {
        GroupCommands::New {
            name,
            id,
            description,
            members,
            strict,
        } => new_group(name, id, description, &members, strict, globals),
        GroupCommands::Add {
            group,
            member,
            role,
            strict,
        } => add_member(&group, &member, role.as_deref(), strict, globals),
        GroupCommands::Show {
            group,
            depth,
            strict,
            format,
        } => show_group(&group, depth, strict, format, globals),
        GroupCommands::List { query, limit, json } => list_groups(&query, limit, json, globals),
    }
}

fn new_group(
    name: String,
    id: Option<String>,
    description: Option<String>,
    members: &[String],
    strict: bool,
    globals: &Globals,
) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    // Resolve every member first so a bad reference stores nothing
    let mut resolved = Vec::with_capacity(members.len());
    for reference in members {
        resolved.push(pick(storage, reference, strict, globals)?);
    }

    let group_id = storage.store(id.as_deref(), RecordFields::Group { name, description })?;
    let group_node = storage
        .node_for_record(RecordType::Group.table_name(), &group_id)?
        .ok_or_else(|| anyhow::anyhow!("node for group {} is missing", group_id))?;

    for member in &resolved {
        group::add_member(storage, &group_node, &member.node, None)?;
    }

    println!("{}", group_id);
    Ok(())
}

fn add_member(
    group_ref: &str,
    member_ref: &str,
    role: Option<&str>,
    strict: bool,
    globals: &Globals,
) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    let target = pick_group(storage, group_ref, strict, globals)?;
    let member = pick(storage, member_ref, strict, globals)?;
    let membership = group::add_member(storage, &target.node, &member.node, role)?;

    println!("{}", membership.has_member.id);
    Ok(())
}

fn show_group(
    group_ref: &str,
    depth: usize,
    strict: bool,
    format: ContextFormat,
    globals: &Globals,
) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    let target = pick_group(storage, group_ref, strict, globals)?;
    let options = ContextOptions {
        depth,
        ..session.config.context_options()
    };
    let tree = group::context(storage, &target.node, &options)?;

    println!("{}", render(&tree, format)?);
    Ok(())
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Members")]
    members: usize,
    #[tabled(rename = "Description")]
    description: String,
}

fn list_groups(query: &str, limit: Option<usize>, json: bool, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;
    let limit = limit.unwrap_or(session.config.search.default_limit);

    let mut rows = Vec::new();
    for candidate in group::search_groups(storage, query, limit)? {
        let members = group::members(storage, &candidate.node)?.len();
        if let Record::Group(g) = candidate.record {
            rows.push(GroupRow {
                id: g.id,
                name: g.name,
                members,
                description: g.description.unwrap_or_default(),
            });
        }
    }

    if json {
        let json: Vec<_> = rows
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "name": r.name,
                    "members": r.members,
                    "description": r.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if rows.is_empty() {
        eprintln!("{} No groups found", "!".yellow());
        return Ok(());
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}

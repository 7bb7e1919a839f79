//! `bonnet search` command
//!
//! Searches node and edge content.
//!
//! # Usage
//! ```bash
//! bonnet search "red car"
//! bonnet search T1                  # exact id
//! bonnet search                     # most recent records
//! bonnet search car --related --depth 2 --format json
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::utils::open_storage;
use super::Globals;
use crate::core::search::{self, SearchMatch, SearchQuery};
use crate::core::traverse::{RelatedRecord, Traversal};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query (empty: most recent records)
    #[arg(default_value = "")]
    pub query: String,

    /// Maximum results (default: search.default_limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Skip edge content
    #[arg(long)]
    pub nodes_only: bool,

    /// Also list records related to the matches
    #[arg(short, long)]
    pub related: bool,

    /// Hops to follow for --related (default: context.default_depth)
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: SearchFormat,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    matches: &'a [SearchMatch],
    related: &'a [RelatedRecord],
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Content")]
    content: String,
}

pub fn run(args: SearchArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let config = &session.config;

    let mut query = SearchQuery::new(args.query.as_str())
        .with_limit(args.limit.unwrap_or(config.search.default_limit))
        .with_recent_limit(config.search.recent_limit);
    if args.nodes_only {
        query = query.nodes_only();
    }

    let matches = search::search(&session.storage, &query)?;

    let related = if args.related {
        let mut seeds: Vec<String> = Vec::new();
        for m in &matches {
            if !seeds.contains(&m.node_id) {
                seeds.push(m.node_id.clone());
            }
        }
        Traversal::new(args.depth.unwrap_or(config.context.default_depth))
            .with_direction(config.graph.direction)
            .related(&session.storage, &seeds)?
    } else {
        Vec::new()
    };

    match args.format {
        SearchFormat::Json => print_json(&matches, &related)?,
        SearchFormat::Compact => print_compact(&matches, &related),
        SearchFormat::Pretty => print_pretty(&matches, &related),
    }

    Ok(())
}

fn print_pretty(matches: &[SearchMatch], related: &[RelatedRecord]) {
    if matches.is_empty() {
        println!("No results found.");
        return;
    }

    println!("{} result(s):", matches.len().to_string().as_str().bold());
    let rows: Vec<MatchRow> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| MatchRow {
            rank: i + 1,
            source: format!("{}:{}", m.source.as_str(), m.kind),
            id: m.record_id.clone(),
            content: preview(&m.content, 60),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if !related.is_empty() {
        println!("\n{}", "Related:".bold());
        for r in related {
            println!(
                "  {} {} [{}] {}",
                "-".repeat(r.hops).as_str().dimmed(),
                r.record.id(),
                r.record.record_type(),
                r.record.label()
            );
        }
    }
}

fn print_compact(matches: &[SearchMatch], related: &[RelatedRecord]) {
    for m in matches {
        println!("{}\t{}\t{}\t{}", m.source.as_str(), m.kind, m.record_id, m.content);
    }
    for r in related {
        println!(
            "related\t{}\t{}\t{}",
            r.node.table_name,
            r.record.id(),
            r.node.searchable_content
        );
    }
}

fn print_json(matches: &[SearchMatch], related: &[RelatedRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(&SearchOutput { matches, related })?;
    println!("{}", json);
    Ok(())
}

fn preview(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        return content.to_string();
    }
    let cut: String = content.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééééééééé", 6), "ééé...");
    }
}

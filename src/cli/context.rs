//! `bonnet context` command
//!
//! Renders the records around a query as a nested tree.
//!
//! # Usage
//! ```bash
//! bonnet context car                    # XML, depth from config
//! bonnet context car --depth 2 --related
//! bonnet context "red car" --pick       # narrow to one record first
//! bonnet context car --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::render::{render, ContextFormat};
use super::utils::{open_storage, pick};
use super::Globals;
use crate::core::context;
use crate::core::search::SearchQuery;

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Search query (empty: most recent records)
    #[arg(default_value = "")]
    pub query: String,

    /// Edges to follow below each match (default: context.default_depth)
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Add related records (both edge directions) not already in the tree
    #[arg(short, long)]
    pub related: bool,

    /// Narrow the matches to a single record
    #[arg(long)]
    pub pick: bool,

    /// With --pick, fail instead of choosing between several records
    #[arg(long, requires = "pick")]
    pub strict: bool,

    /// Maximum matches (default: search.default_limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xml")]
    pub format: ContextFormat,
}

pub fn run(args: ContextArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let config = &session.config;
    let storage = &session.storage;

    let mut options = config.context_options();
    if let Some(depth) = args.depth {
        options.depth = depth;
    }
    options.include_related |= args.related;

    let tree = if args.pick {
        let chosen = pick(storage, &args.query, args.strict, globals)?;
        context::build_from_nodes(storage, &args.query, &[chosen.node.id.as_str()], &options)?
    } else {
        let query = SearchQuery::new(args.query.as_str())
            .with_limit(args.limit.unwrap_or(config.search.default_limit))
            .with_recent_limit(config.search.recent_limit);
        context::assemble(storage, &query, &options)?
    };

    if tree.is_empty() {
        eprintln!("{} Nothing found for '{}'", "!".yellow(), args.query);
    }
    println!("{}", render(&tree, args.format)?);

    Ok(())
}

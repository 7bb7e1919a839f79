//! `bonnet link` command
//!
//! # Usage
//! ```bash
//! bonnet link T1 T2                         # "references" edge
//! bonnet link car garage --type parked_in --note "weekdays only"
//! ```

use anyhow::Result;
use clap::Args;
use tracing::debug;

use super::utils::{open_storage, pick};
use super::Globals;

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Source record (id or search text)
    pub from: String,

    /// Target record (id or search text)
    pub to: String,

    /// Edge type
    #[arg(short = 't', long = "type", default_value = "references")]
    pub edge_type: String,

    /// Searchable description of the relationship
    #[arg(short, long)]
    pub note: Option<String>,

    /// Fail instead of choosing when a reference matches several records
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: LinkArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    let from = pick(storage, &args.from, args.strict, globals)?;
    let to = pick(storage, &args.to, args.strict, globals)?;
    debug!(from = from.record.id(), to = to.record.id(), "link endpoints resolved");

    let edge = storage.create_edge(&from.node.id, &to.node.id, &args.edge_type, args.note.as_deref())?;

    println!("{}", edge.id);
    Ok(())
}

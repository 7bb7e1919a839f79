//! `bonnet topic` command
//!
//! # Usage
//! ```bash
//! bonnet topic "Rust"                       # next T<n> id
//! bonnet topic "Kubernetes" --short k8s --id K8S
//! ```

use anyhow::Result;
use clap::Args;

use super::utils::open_storage;
use super::Globals;
use crate::core::record::RecordFields;

#[derive(Args, Debug)]
pub struct TopicArgs {
    /// Topic name
    pub name: String,

    /// Explicit id (default: next counter id)
    #[arg(long)]
    pub id: Option<String>,

    /// Short name or abbreviation
    #[arg(short, long)]
    pub short: Option<String>,
}

pub fn run(args: TopicArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;

    let fields = RecordFields::Entity {
        name: args.name,
        short_name: args.short,
    };
    let id = session.storage.store(args.id.as_deref(), fields)?;

    println!("{}", id);
    Ok(())
}

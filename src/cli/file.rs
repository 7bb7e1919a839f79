//! `bonnet file` command
//!
//! # Usage
//! ```bash
//! bonnet file docs/setup.md --description "dev setup notes"
//! bonnet file docs/setup.md --read --include-content --about project
//! ```

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{open_storage, pick};
use super::Globals;
use crate::core::record::RecordFields;

/// Edge type from a record to its files
pub const HAS_FILE: &str = "has_file";

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Path of the file
    pub path: String,

    /// What the file is
    #[arg(short, long)]
    pub description: Option<String>,

    /// Inline content to store with the file
    #[arg(short, long, conflicts_with = "read")]
    pub content: Option<String>,

    /// Store the file's current content
    #[arg(long)]
    pub read: bool,

    /// Echo content in rendered context
    #[arg(long)]
    pub include_content: bool,

    /// Record the file belongs to (id or search text)
    #[arg(short, long)]
    pub about: Option<String>,

    /// Explicit id (default: next counter id)
    #[arg(long)]
    pub id: Option<String>,

    /// Fail instead of choosing when --about matches several records
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: FileArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    let content = if args.read {
        Some(
            std::fs::read_to_string(&args.path)
                .with_context(|| format!("Failed to read {}", args.path))?,
        )
    } else {
        args.content
    };

    let fields = RecordFields::File {
        file_path: args.path,
        description: args.description,
        content,
        include_content: args.include_content,
    };

    let id = match &args.about {
        Some(reference) => {
            let parent = pick(storage, reference, args.strict, globals)?;
            storage.store_attached(args.id.as_deref(), fields, &parent.node, HAS_FILE)?
        }
        None => storage.store(args.id.as_deref(), fields)?,
    };

    println!("{}", id);
    Ok(())
}

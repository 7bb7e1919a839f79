//! CLI utility functions
//!
//! Common helper functions shared across CLI commands:
//! - Opening storage at the configured location (open_storage)
//! - Turning a free-text reference into one record (pick, pick_group)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};

use super::Globals;
use crate::config::Config;
use crate::core::error::GraphError;
use crate::core::resolve::{self, Candidate, Resolution};
use crate::core::storage::Storage;

/// Storage plus the config it was opened with
pub struct Session {
    pub config: Config,
    pub storage: Storage,
    pub db_path: PathBuf,
}

/// Load config and open the database it points to.
///
/// The database and its parent directory are created on first use.
pub fn open_storage(globals: &Globals) -> Result<Session> {
    let config = Config::load()?;
    let db_path = globals.db.clone().unwrap_or_else(|| config.data_path());

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let storage = Storage::open(&db_path)?.with_id_prefixes(config.id_prefixes());
    Ok(Session {
        config,
        storage,
        db_path,
    })
}

/// Resolve `reference` to one record.
///
/// With several candidates: `strict` fails, an attended terminal gets a
/// numbered selection, anything else takes the best-ranked match.
pub fn pick(storage: &Storage, reference: &str, strict: bool, globals: &Globals) -> Result<Candidate> {
    let resolution = resolve::resolve(storage, reference)?;
    choose(reference, resolution, strict, globals)
}

/// Like [`pick`], but only groups are candidates
pub fn pick_group(
    storage: &Storage,
    reference: &str,
    strict: bool,
    globals: &Globals,
) -> Result<Candidate> {
    let resolution = resolve::resolve_group(storage, reference)?;
    match resolution {
        Resolution::Missing => Err(GraphError::not_found("Group", reference).into()),
        resolution => choose(reference, resolution, strict, globals),
    }
}

fn choose(
    reference: &str,
    resolution: Resolution,
    strict: bool,
    globals: &Globals,
) -> Result<Candidate> {
    if strict {
        return Ok(resolution.require_unique(reference)?);
    }

    match resolution {
        Resolution::Found(candidate) => Ok(candidate),
        Resolution::Missing => Err(GraphError::not_found("Record", reference).into()),
        Resolution::Ambiguous(candidates) => {
            if !globals.no_input && console::user_attended() && console::user_attended_stderr() {
                select(reference, candidates)
            } else {
                let count = candidates.len();
                match candidates.into_iter().next() {
                    Some(first) => {
                        eprintln!(
                            "{} '{}' matched {} records; using {} ({})",
                            "!".yellow(),
                            reference,
                            count,
                            first.record.id(),
                            first.record.label()
                        );
                        Ok(first)
                    }
                    None => bail!("No record matches '{}'", reference),
                }
            }
        }
    }
}

fn select(reference: &str, mut candidates: Vec<Candidate>) -> Result<Candidate> {
    let items: Vec<String> = candidates
        .iter()
        .map(|c| {
            format!(
                "{} [{}] {}",
                c.record.id(),
                c.record.record_type(),
                c.record.label()
            )
        })
        .collect();

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("'{}' matches several records", reference))
        .items(&items)
        .default(0)
        .interact_opt()?;

    match choice {
        Some(index) => Ok(candidates.swap_remove(index)),
        None => bail!("Selection cancelled"),
    }
}

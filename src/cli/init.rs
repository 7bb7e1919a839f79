//! `bonnet init` command
//!
//! Initializes a bonnet directory.
//!
//! # Usage
//! ```bash
//! bonnet init                    # Initialize in current directory
//! bonnet init /path/to/project   # Initialize in specific path
//! bonnet init --global           # Initialize global ~/.bonnet
//! ```

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE, DB_FILE, DIR_NAME};
use crate::core::storage::Storage;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global config (~/.bonnet)
    #[arg(long)]
    pub global: bool,

    /// Force re-initialization
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let base_path = if args.global {
        directories::UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        args.path.unwrap_or_else(|| PathBuf::from("."))
    };

    let bonnet_dir = base_path.join(DIR_NAME);

    if bonnet_dir.exists() && !args.force {
        bail!(
            "Directory {} is already initialized. Use --force to reinitialize.",
            base_path.display()
        );
    }

    fs::create_dir_all(&bonnet_dir)?;

    let config_path = bonnet_dir.join(CONFIG_FILE);
    Config::default().save_to(&config_path)?;

    // Schema is created on open; existing records survive --force
    let db_path = bonnet_dir.join(DB_FILE);
    Storage::open(&db_path)?;

    println!("{} Initialized bonnet in {}", "✓".green(), base_path.display());
    println!("   Config:   {}", config_path.display());
    println!("   Database: {}", db_path.display());
    println!("\nNext steps:");
    println!("  bonnet topic \"car\"");
    println!("  bonnet attr --about car \"color=red\"");
    println!("  bonnet context car");

    Ok(())
}

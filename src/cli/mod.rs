//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod attr;
pub mod config;
pub mod context;
pub mod file;
pub mod group;
pub mod init;
pub mod link;
pub mod render;
pub mod search;
pub mod show;
pub mod stats;
pub mod topic;
pub mod utils;

/// bonnet - personal knowledge graph
///
/// Store topics, attributes and files, link them, and render the context
/// around a query for pasting into a prompt.
#[derive(Parser, Debug)]
#[command(name = "bonnet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file (default: nearest .bonnet/bonnet.db, then ~/.bonnet)
    #[arg(long, global = true, env = "BONNET_DATABASE")]
    pub db: Option<PathBuf>,

    /// Never prompt; ambiguous references use the best match
    #[arg(long, global = true)]
    pub no_input: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn globals(&self) -> Globals {
        Globals {
            db: self.db.clone(),
            no_input: self.no_input,
        }
    }
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub db: Option<PathBuf>,
    pub no_input: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a bonnet directory
    Init(init::InitArgs),

    /// Store a topic (entity)
    Topic(topic::TopicArgs),

    /// Store an attribute (FACT, REF, TASK, RULE)
    Attr(attr::AttrArgs),

    /// Store a file reference
    File(file::FileArgs),

    /// Link two records with a typed edge
    Link(link::LinkArgs),

    /// Create groups and manage their members
    Group(group::GroupArgs),

    /// Search records and edges
    Search(search::SearchArgs),

    /// Render the context around a query
    Context(context::ContextArgs),

    /// Show one record and its edges
    Show(show::ShowArgs),

    /// Show database statistics
    Stats(stats::StatsArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),
}

/// Dispatch a parsed command
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let globals = cli.globals();
    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Topic(args) => topic::run(args, &globals),
        Commands::Attr(args) => attr::run(args, &globals),
        Commands::File(args) => file::run(args, &globals),
        Commands::Link(args) => link::run(args, &globals),
        Commands::Group(args) => group::execute(args, &globals),
        Commands::Search(args) => search::run(args, &globals),
        Commands::Context(args) => context::run(args, &globals),
        Commands::Show(args) => show::run(args, &globals),
        Commands::Stats(args) => stats::execute(args, &globals),
        Commands::Config(args) => config::run(args),
    }
}

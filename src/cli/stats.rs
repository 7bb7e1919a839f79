//! Stats command - Show database statistics

use clap::Args;

use super::utils::open_storage;
use super::Globals;

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute stats command
pub fn execute(args: StatsArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = open_storage(globals)?;
    let stats = session.storage.stats()?;

    if args.json {
        let json = serde_json::json!({
            "entities": stats.entities,
            "attributes": stats.attributes,
            "files": stats.files,
            "groups": stats.groups,
            "records": stats.records(),
            "nodes": stats.nodes,
            "edges": stats.edges,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("📊 Knowledge Graph Statistics\n");
        println!("  Records:        {}", stats.records());
        println!("  ├── Entities:   {}", stats.entities);
        println!("  ├── Attributes: {}", stats.attributes);
        println!("  ├── Files:      {}", stats.files);
        println!("  └── Groups:     {}", stats.groups);
        println!("  Nodes:          {}", stats.nodes);
        println!("  Edges:          {}", stats.edges);

        println!("\n📁 Database: {}", session.db_path.display());
    }

    Ok(())
}

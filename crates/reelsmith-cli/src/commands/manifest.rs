//! Asset manifest commands

use super::Context;
use anyhow::Result;
use clap::Subcommand;
use reelsmith_gen::manifest::AssetRecord;
use reelsmith_gen::{AssetStatus, Collection, ListFilter, ManifestStore};

#[derive(Subcommand)]
pub enum ManifestCommands {
    /// Write an empty manifest
    Init {
        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },

    /// Show generation progress
    Stats,

    /// List records
    List {
        /// pending, generated, failed, a chapter number, or all
        #[arg(default_value = "all")]
        filter: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Put a record back to pending
    Reset {
        /// Record id
        id: String,

        /// images, audio or video
        #[arg(long, short)]
        collection: String,
    },
}

pub fn run(ctx: &Context, cmd: ManifestCommands) -> Result<()> {
    let store = ManifestStore::for_project(&ctx.paths);
    match cmd {
        ManifestCommands::Init { force } => {
            if store.path().exists() && !force {
                anyhow::bail!(
                    "Manifest already exists at {} (use --force to overwrite)",
                    store.path().display()
                );
            }
            store.init()?;
            println!("Created {}", store.path().display());
            Ok(())
        }
        ManifestCommands::Stats => {
            let stats = store.load()?.stats();
            println!("Manifest: {}", store.path().display());
            println!("  Total:     {}", stats.total);
            println!("  Pending:   {}", stats.pending);
            println!("  Generated: {}", stats.generated);
            println!("  Failed:    {}", stats.failed);
            Ok(())
        }
        ManifestCommands::List { filter, format } => run_list(&store, &filter, &format),
        ManifestCommands::Reset { id, collection } => {
            let collection: Collection = collection.parse()?;
            if store.reset_status(&id, collection)? {
                println!("Reset {} ({}) to {}", id, collection, AssetStatus::Pending);
            } else {
                println!("No {} record with id '{}'", collection, id);
            }
            Ok(())
        }
    }
}

fn run_list(store: &ManifestStore, filter: &str, format: &str) -> Result<()> {
    let filter: ListFilter = filter.parse()?;
    let selection = store.load()?.list(filter);

    match format {
        "json" => {
            let value = serde_json::json!({
                "images": selection.images,
                "audio": selection.audio,
                "video": selection.video,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "text" => {
            print_group("Images", &selection.images);
            print_group("Audio", &selection.audio);
            print_group("Video", &selection.video);
            println!();
            println!("{} records", selection.len());
        }
        other => anyhow::bail!("Unknown format '{}'. Use text or json", other),
    }
    Ok(())
}

fn print_group<T: AssetRecord>(title: &str, records: &[T]) {
    if records.is_empty() {
        return;
    }
    println!("{}:", title);
    for record in records {
        println!(
            "  [{:<9}] ch{:<2} {:<30} {}",
            record.status().to_string(),
            record.chapter(),
            record.id(),
            record.filename()
        );
    }
}

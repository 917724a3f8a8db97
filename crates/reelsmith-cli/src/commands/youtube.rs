//! YouTube search (listing only)

use anyhow::Result;
use clap::Subcommand;
use reelsmith_gen::youtube::{search, DEFAULT_SEARCH_LIMIT};

#[derive(Subcommand)]
pub enum YoutubeCommands {
    /// Search YouTube via yt-dlp and list the results
    Search {
        query: String,

        /// Number of results
        #[arg(long, short = 'n', default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },
}

pub fn run(cmd: YoutubeCommands) -> Result<()> {
    match cmd {
        YoutubeCommands::Search { query, limit } => {
            println!("Searching YouTube for: \"{}\" (max {})", query, limit);
            let results = search(&query, limit)?;
            println!("Found {} results:", results.len());
            println!();
            for (i, r) in results.iter().enumerate() {
                println!("  {}. {}", i + 1, r.title);
                println!("     Channel: {} | Duration: {}", r.channel, r.duration);
                println!("     URL: {}", r.url);
                println!();
            }
            Ok(())
        }
    }
}

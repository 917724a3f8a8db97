//! Pexels stock media commands

use super::{in_root, Context};
use anyhow::Result;
use clap::{Args, Subcommand};
use reelsmith_gen::stock::{
    pick_video_file, save_all, save_photo, save_video, PexelsClient, PexelsPhoto, PexelsVideo,
    SearchOptions, StockType,
};
use std::path::PathBuf;

#[derive(Args, Clone)]
pub struct QueryArgs {
    /// Search terms
    pub query: String,

    /// photo or video
    #[arg(long = "type", default_value = "photo")]
    pub kind: String,

    /// landscape, portrait or square
    #[arg(long)]
    pub orientation: Option<String>,

    /// large, medium or small (photos)
    #[arg(long)]
    pub size: Option<String>,

    /// Dominant color (photos)
    #[arg(long)]
    pub color: Option<String>,

    /// Minimum seconds (videos)
    #[arg(long)]
    pub min_duration: Option<u32>,

    /// Maximum seconds (videos)
    #[arg(long)]
    pub max_duration: Option<u32>,

    #[arg(long)]
    pub page: Option<u32>,
}

impl QueryArgs {
    fn options(&self, count: u32) -> SearchOptions {
        SearchOptions {
            query: self.query.clone(),
            count,
            orientation: self.orientation.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
            min_duration: self.min_duration,
            max_duration: self.max_duration,
            page: self.page,
        }
    }
}

#[derive(Subcommand)]
pub enum StockCommands {
    /// Search and print results
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Results per page
        #[arg(long, short, default_value = "10")]
        count: u32,
    },

    /// Download by id, or the top results of a search
    Download {
        /// Pexels id to download
        #[arg(long, conflicts_with = "search")]
        id: Option<u64>,

        /// Search terms to download results for
        #[arg(long)]
        search: Option<String>,

        /// photo or video
        #[arg(long = "type", default_value = "photo")]
        kind: String,

        /// How many search results to download
        #[arg(long, short, default_value = "5")]
        count: u32,

        #[arg(long)]
        orientation: Option<String>,

        /// Filename prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Output directory (defaults to public/images or public/video)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(ctx: &Context, cmd: StockCommands) -> Result<()> {
    let config = ctx.config()?;
    let client = PexelsClient::from_config(&config)?;

    match cmd {
        StockCommands::Search { query, count } => {
            let kind: StockType = query.kind.parse()?;
            let options = query.options(count);
            println!("Searching Pexels {}s for \"{}\"...", kind, options.query);
            match kind {
                StockType::Photo => {
                    let photos = client.search_photos(&options)?;
                    println!("Found {} photos", photos.len());
                    photos.iter().for_each(print_photo);
                }
                StockType::Video => {
                    let videos = client.search_videos(&options)?;
                    println!("Found {} videos", videos.len());
                    videos.iter().for_each(print_video);
                }
            }
            Ok(())
        }
        StockCommands::Download {
            id,
            search,
            kind,
            count,
            orientation,
            prefix,
            output,
        } => {
            let kind: StockType = kind.parse()?;
            let output_dir = output.map(|p| in_root(ctx, p)).unwrap_or_else(|| match kind {
                StockType::Photo => ctx.paths.images_dir(),
                StockType::Video => ctx.paths.video_dir(),
            });
            let fetch = |url: &str| client.fetch(url);

            match (id, search) {
                (Some(id), _) => {
                    match kind {
                        StockType::Photo => save_photo(&client.photo(id)?, &output_dir, &prefix, fetch)?,
                        StockType::Video => save_video(&client.video(id)?, &output_dir, &prefix, fetch)?,
                    };
                    Ok(())
                }
                (None, Some(query)) => {
                    let options = SearchOptions {
                        query,
                        count,
                        orientation,
                        ..SearchOptions::default()
                    };
                    let saved = match kind {
                        StockType::Photo => {
                            let photos = client.search_photos(&options)?;
                            println!("Downloading {} photos...", photos.len());
                            save_all(&photos, |p| save_photo(p, &output_dir, &prefix, fetch))
                        }
                        StockType::Video => {
                            let videos = client.search_videos(&options)?;
                            println!("Downloading {} videos...", videos.len());
                            save_all(&videos, |v| save_video(v, &output_dir, &prefix, fetch))
                        }
                    };
                    println!("Done: {} files in {}", saved, output_dir.display());
                    Ok(())
                }
                (None, None) => anyhow::bail!("Specify --id <ID> or --search <QUERY>"),
            }
        }
    }
}

fn print_photo(photo: &PexelsPhoto) {
    println!();
    println!("  ID: {}", photo.id);
    if let Some(alt) = photo.alt.as_deref().filter(|a| !a.is_empty()) {
        println!("  Alt: {}", alt);
    }
    println!("  Photographer: {}", photo.photographer);
    println!("  Size: {}x{}", photo.width, photo.height);
    if let Some(color) = &photo.avg_color {
        println!("  Color: {}", color);
    }
    println!("  URL: {}", photo.url);
}

fn print_video(video: &PexelsVideo) {
    println!();
    println!("  ID: {}", video.id);
    println!("  Creator: {}", video.user.name);
    println!("  Duration: {}s", video.duration);
    println!("  Size: {}x{}", video.width, video.height);
    if let Some(best) = pick_video_file(video) {
        println!(
            "  Best quality: {} {}x{}",
            best.quality.as_deref().unwrap_or("unknown"),
            best.width.unwrap_or(0),
            best.height.unwrap_or(0)
        );
    }
    println!("  URL: {}", video.url);
}

//! Batch generation over the asset manifest

use super::Context;
use anyhow::Result;
use clap::Args;
use reelsmith_gen::{run_batch, BatchOptions, KindFilter, ManifestStore, ProviderRouter, Selection};
use std::time::Duration;

#[derive(Args)]
pub struct BatchArgs {
    /// Only pending records of this chapter (audio of chapter 0 included)
    #[arg(long, conflicts_with = "all")]
    pub chapter: Option<u32>,

    /// Every pending record
    #[arg(long)]
    pub all: bool,

    /// images, audio, video or all
    #[arg(long = "type", default_value = "all")]
    pub kind: String,

    /// Milliseconds between requests (defaults to [generation] delay_ms)
    #[arg(long)]
    pub delay: Option<u64>,

    /// Print the selection without generating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Aspect ratio for images (defaults to [generation] aspect_ratio)
    #[arg(long)]
    pub aspect_ratio: Option<String>,
}

pub fn run(ctx: &Context, args: BatchArgs) -> Result<()> {
    let selection = match (args.chapter, args.all) {
        (Some(n), _) => Selection::Chapter(n),
        (None, true) => Selection::AllPending,
        (None, false) => anyhow::bail!("Specify --chapter <N> or --all"),
    };
    let kinds: KindFilter = args.kind.parse()?;
    let config = ctx.config()?;

    let options = BatchOptions {
        selection,
        kinds,
        delay: Duration::from_millis(args.delay.unwrap_or(config.generation.delay_ms)),
        dry_run: args.dry_run,
        aspect_ratio: args
            .aspect_ratio
            .as_deref()
            .unwrap_or(&config.generation.aspect_ratio)
            .parse()?,
    };

    // a dry run never calls a provider, so it needs no credentials
    let router = if args.dry_run {
        ProviderRouter::new()
    } else {
        ctx.router(&config, &kinds.media_kinds())?
    };

    let store = ManifestStore::for_project(&ctx.paths);
    let report = run_batch(&options, &store, &router, &ctx.paths, std::thread::sleep)?;
    if !report.dry_run {
        report.print_summary();
    }
    Ok(())
}

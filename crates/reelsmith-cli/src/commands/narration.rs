//! Narration generation from the narration script

use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use reelsmith_gen::narration::DEFAULT_CONCURRENCY;
use reelsmith_gen::{run_narration, MediaKind, NarrationMode, ProviderRouter};
use reelsmith_timeline::NarrationScript;

#[derive(Args)]
pub struct NarrationArgs {
    /// Only entries of this chapter
    #[arg(long)]
    pub chapter: Option<u32>,

    /// List the entries without generating
    #[arg(long)]
    pub dry_run: bool,

    /// One request at a time
    #[arg(long, conflicts_with = "concurrency")]
    pub sequential: bool,

    /// Requests in flight per chunk
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Voice alias or ElevenLabs voice id
    #[arg(long)]
    pub voice: Option<String>,
}

pub fn run(ctx: &Context, args: NarrationArgs) -> Result<()> {
    let script_path = ctx.paths.narration_script_path();
    let script = NarrationScript::load(&script_path)
        .with_context(|| format!("Failed to load narration script {}", script_path.display()))?;
    let entries = script.select(args.chapter);
    if entries.is_empty() {
        anyhow::bail!("No narration entries found");
    }

    let mode = if args.sequential {
        NarrationMode::Sequential
    } else {
        let concurrency = args.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            anyhow::bail!("--concurrency must be at least 1");
        }
        NarrationMode::Parallel { concurrency }
    };

    let config = ctx.config()?;
    let voice_id = config.resolve_voice(args.voice.as_deref());
    let router = if args.dry_run {
        ProviderRouter::new()
    } else {
        ctx.router(&config, &[MediaKind::Narration])?
    };

    if let Some(chapter) = args.chapter {
        println!("Chapter: {}", chapter);
    }
    run_narration(
        &entries,
        mode,
        args.dry_run,
        &voice_id,
        &router,
        &ctx.paths,
        std::thread::sleep,
    )?;
    Ok(())
}

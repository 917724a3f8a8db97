//! Long-form music from the music plan

use super::{in_root, Context};
use anyhow::Result;
use reelsmith_gen::music::{run_music_plan, MusicPlan};
use reelsmith_gen::providers::elevenlabs::ElevenLabsProvider;
use reelsmith_gen::providers::mock::silent_mp3;
use std::path::PathBuf;

pub fn run(ctx: &Context, plan: Option<PathBuf>, filter: Option<&str>) -> Result<()> {
    let plan_path = plan
        .map(|p| in_root(ctx, p))
        .unwrap_or_else(|| ctx.paths.music_plan_path());
    let plan = MusicPlan::load(&plan_path)?;
    let tracks = plan.select(filter);
    if tracks.is_empty() {
        anyhow::bail!("No tracks in {} match the filter", plan_path.display());
    }
    println!("Tracks to compose: {}", tracks.len());

    let report = if ctx.is_mock() {
        run_music_plan(&tracks, &ctx.paths, |_, ms| Ok(silent_mp3(ms as f64 / 1000.0)))?
    } else {
        let config = ctx.config()?;
        let provider = ElevenLabsProvider::from_config(&config)?;
        run_music_plan(&tracks, &ctx.paths, |prompt, ms| provider.compose(prompt, ms))?
    };

    println!();
    println!("Generated: {}", report.generated);
    println!("Skipped:   {}", report.skipped);
    println!("Failed:    {}", report.failed);
    Ok(())
}

//! Narration duration analysis

use super::Context;
use anyhow::Result;
use reelsmith_gen::durations::{analyze, ffprobe_duration, print_report, write_analysis};
use reelsmith_timeline::NarrationScript;

pub fn run(ctx: &Context) -> Result<()> {
    let script = NarrationScript::load(&ctx.paths.narration_script_path())?;
    let results = analyze(&script.entries, &ctx.paths.narration_dir(), ffprobe_duration)?;
    print_report(&results);
    let path = write_analysis(&ctx.paths, &results)?;
    println!();
    println!("Analysis saved to: {}", path.display());
    Ok(())
}

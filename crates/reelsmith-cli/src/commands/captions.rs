//! Caption generation

use super::{in_root, Context};
use anyhow::Result;
use reelsmith_gen::captions::generate_captions;
use reelsmith_gen::providers::elevenlabs::ElevenLabsProvider;
use std::path::PathBuf;

pub fn run(ctx: &Context, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = input
        .map(|p| in_root(ctx, p))
        .unwrap_or_else(|| ctx.paths.narration_dir());
    let output = output
        .map(|p| in_root(ctx, p))
        .unwrap_or_else(|| ctx.paths.captions_path());

    let config = ctx.config()?;
    let provider = ElevenLabsProvider::from_config(&config)?;
    let tracks = generate_captions(&input, &output, |path| provider.transcribe(path))?;

    let words: usize = tracks.iter().map(|t| t.words.len()).sum();
    println!("{} tracks, {} words", tracks.len(), words);
    Ok(())
}

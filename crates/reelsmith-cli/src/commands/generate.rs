//! One-off generation commands

use super::Context;
use anyhow::Result;
use clap::Subcommand;
use reelsmith_gen::{AspectRatio, GenerateRequest, GenerateResult, MediaKind};

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Generate an image
    Image {
        /// What to depict
        #[arg(long, short)]
        prompt: String,

        /// Output filename (under public/images unless it starts with public/)
        #[arg(long, short)]
        output: String,

        /// 16:9, 9:16 or 1:1 (defaults to [generation] aspect_ratio)
        #[arg(long)]
        aspect_ratio: Option<String>,
    },

    /// Speak text with a narration voice
    Tts {
        /// Text to speak
        #[arg(long, short)]
        text: String,

        #[arg(long, short)]
        output: String,

        /// Voice alias or ElevenLabs voice id
        #[arg(long)]
        voice: Option<String>,
    },

    /// Generate a sound effect (at most 22 seconds)
    Sfx {
        #[arg(long, short)]
        prompt: String,

        #[arg(long, short)]
        output: String,

        /// Seconds
        #[arg(long, short)]
        duration: Option<f64>,
    },

    /// Generate a short music cue (at most 22 seconds)
    Music {
        #[arg(long, short)]
        prompt: String,

        #[arg(long, short)]
        output: String,

        /// Seconds
        #[arg(long, short)]
        duration: Option<f64>,
    },

    /// Generate a video clip, optionally animating an existing image
    Video {
        #[arg(long, short)]
        prompt: String,

        #[arg(long, short)]
        output: String,

        /// Seconds
        #[arg(long, short)]
        duration: Option<f64>,

        /// Source image filename under public/images
        #[arg(long)]
        image: Option<String>,
    },
}

pub fn run(ctx: &Context, cmd: GenerateCommands) -> Result<()> {
    let config = ctx.config()?;

    let request = match cmd {
        GenerateCommands::Image {
            prompt,
            output,
            aspect_ratio,
        } => {
            let aspect: AspectRatio = aspect_ratio
                .as_deref()
                .unwrap_or(&config.generation.aspect_ratio)
                .parse()?;
            GenerateRequest::new(MediaKind::Image, prompt, output).with_aspect_ratio(aspect)
        }
        GenerateCommands::Tts { text, output, voice } => {
            GenerateRequest::new(MediaKind::Narration, text, output).with_voice(voice)
        }
        GenerateCommands::Sfx {
            prompt,
            output,
            duration,
        } => GenerateRequest::new(MediaKind::SoundEffect, prompt, output).with_duration(duration),
        GenerateCommands::Music {
            prompt,
            output,
            duration,
        } => GenerateRequest::new(MediaKind::Music, prompt, output).with_duration(duration),
        GenerateCommands::Video {
            prompt,
            output,
            duration,
            image,
        } => GenerateRequest::new(MediaKind::Video, prompt, output)
            .with_duration(duration.or(Some(config.generation.video_duration)))
            .with_source_image(image),
    };

    let router = ctx.router(&config, &[request.kind])?;
    let provider = router.provider_for(request.kind)?;

    println!("Generating {} via {}...", request.kind, provider.name());
    println!("  Prompt: {}", provider.build_prompt(&request));

    let result = router.generate(&request, &ctx.paths)?;
    print_result(&result);
    Ok(())
}

fn print_result(result: &GenerateResult) {
    if result.placeholder {
        println!("Placeholder written: {}", result.output_path.display());
        if let Some(note) = result.metadata.get("note") {
            println!("  {}", note);
        }
        return;
    }
    println!("Saved: {}", result.output_path.display());
    println!("  Took {:.1}s", result.duration_secs);
    let mut keys: Vec<&String> = result.metadata.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {}: {}", key, result.metadata[key]);
    }
}

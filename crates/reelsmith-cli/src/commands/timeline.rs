//! Timeline inspection

use super::Context;
use anyhow::Result;
use clap::Subcommand;
use reelsmith_timeline::layout::load_chapters;
use reelsmith_timeline::timing::CHAPTER_TRANSITION_FRAMES;
use reelsmith_timeline::{frames_to_seconds, FramePosition, NarrationScript, Timeline};

#[derive(Subcommand)]
pub enum TimelineCommands {
    /// Chapter placement and total length
    Summary {
        /// Cross-fade frames between chapters
        #[arg(long, default_value_t = CHAPTER_TRANSITION_FRAMES)]
        transition: u32,
    },

    /// What plays at a global frame
    At {
        frame: u32,

        #[arg(long, default_value_t = CHAPTER_TRANSITION_FRAMES)]
        transition: u32,
    },
}

pub fn run(ctx: &Context, cmd: TimelineCommands) -> Result<()> {
    let chapters = load_chapters(&ctx.paths.chapters_path())?;

    match cmd {
        TimelineCommands::Summary { transition } => {
            let timeline = Timeline::with_transitions(&chapters, transition);
            for (placement, chapter) in timeline.placements().iter().zip(&chapters) {
                println!(
                    "  {:>2}. {:<40} frames {:>6}-{:<6} ({:.1} min, {} sections)",
                    placement.chapter_id,
                    placement.title,
                    placement.range.start,
                    placement.range.end,
                    chapter.duration_minutes(),
                    chapter.sections.len()
                );
            }
            println!();
            println!(
                "Total: {} frames ({:.1}s), {} transitions of {} frames",
                timeline.total_frames(),
                timeline.total_seconds(),
                chapters.len().saturating_sub(1),
                timeline.transition_frames()
            );
            Ok(())
        }
        TimelineCommands::At { frame, transition } => {
            let timeline = Timeline::with_transitions(&chapters, transition);
            println!("Frame {} ({:.2}s)", frame, frames_to_seconds(frame));

            match timeline.locate(frame) {
                FramePosition::Chapter { index, local_frame } => {
                    let chapter = &chapters[index];
                    println!("  Chapter {}: {} (local frame {})", chapter.id, chapter.title, local_frame);
                    let section = chapter
                        .section_ranges()
                        .iter()
                        .position(|r| r.contains(local_frame));
                    if let Some(i) = section {
                        println!("  Section: {}", chapter.sections[i].title);
                    }

                    let script_path = ctx.paths.narration_script_path();
                    if script_path.exists() {
                        let script = NarrationScript::load(&script_path)?;
                        if let Some(entry) = script.active_at(chapter.id, local_frame) {
                            println!("  Narration: {} \"{}\"", entry.id, entry.text);
                        }
                    }
                }
                FramePosition::Transition { from, to, progress } => {
                    println!(
                        "  Cross-fade {} -> {} ({:.0}%)",
                        chapters[from].title,
                        chapters[to].title,
                        progress * 100.0
                    );
                }
                FramePosition::End => println!("  Past the end ({} frames)", timeline.total_frames()),
            }
            Ok(())
        }
    }
}

//! Long-form background music from a TOML plan
//!
//! ```toml
//! [[track]]
//! id = "ch1-background"
//! prompt = "Instrumental cinematic ambient music, slow sitar and strings"
//! duration_ms = 120000
//! ```

use crate::config::ProjectPaths;
use crate::providers::elevenlabs::compose_with_suggestion;
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub id: String,
    pub prompt: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicPlan {
    #[serde(default, rename = "track")]
    pub tracks: Vec<MusicTrack>,
}

impl MusicPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ReelError::TomlParse(format!("Failed to parse music plan {}: {}", path.display(), e))
        })
    }

    /// Tracks whose id contains `filter` (all of them without a filter)
    pub fn select(&self, filter: Option<&str>) -> Vec<&MusicTrack> {
        self.tracks
            .iter()
            .filter(|t| filter.map(|f| t.id.contains(f)).unwrap_or(true))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Generated { path: PathBuf, prompt: String },
    Skipped(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusicReport {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn track_path(paths: &ProjectPaths, track: &MusicTrack) -> PathBuf {
    paths.music_dir().join(format!("{}.mp3", track.id))
}

/// Compose one track unless its file already exists
pub fn compose_track<F>(track: &MusicTrack, paths: &ProjectPaths, compose: &mut F) -> Result<TrackOutcome>
where
    F: FnMut(&str, u64) -> Result<Vec<u8>>,
{
    let path = track_path(paths, track);
    println!("Generating: {}", track.id);
    println!("  Duration: {}s", track.duration_ms as f64 / 1000.0);
    println!("  Output: {}", path.display());

    if path.exists() {
        println!("  Already exists, skipping");
        return Ok(TrackOutcome::Skipped(path));
    }

    match compose_with_suggestion(&track.prompt, |prompt| compose(prompt, track.duration_ms)) {
        Ok((bytes, prompt)) => {
            std::fs::create_dir_all(paths.music_dir())?;
            std::fs::write(&path, bytes)?;
            println!("  Saved: {}", path.display());
            Ok(TrackOutcome::Generated { path, prompt })
        }
        Err(e) => {
            eprintln!("  Error generating {}: {}", track.id, e);
            Ok(TrackOutcome::Failed(e.to_string()))
        }
    }
}

/// Compose every selected track in order. A failed track does not stop the
/// run; local I/O errors do.
pub fn run_music_plan<F>(tracks: &[&MusicTrack], paths: &ProjectPaths, mut compose: F) -> Result<MusicReport>
where
    F: FnMut(&str, u64) -> Result<Vec<u8>>,
{
    let mut report = MusicReport::default();
    for track in tracks {
        match compose_track(track, paths, &mut compose)? {
            TrackOutcome::Generated { .. } => report.generated += 1,
            TrackOutcome::Skipped(_) => report.skipped += 1,
            TrackOutcome::Failed(_) => report.failed += 1,
        }
    }
    Ok(report)
}

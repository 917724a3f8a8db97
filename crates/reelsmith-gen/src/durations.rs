//! Compare narration audio lengths against the frames the script allots

use crate::config::ProjectPaths;
use reelsmith_core::{ReelError, Result};
use reelsmith_timeline::{NarrationEntry, FPS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Rough MP3 throughput at 128 kbps
const FALLBACK_KB_PER_SEC: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationAnalysis {
    pub id: String,
    pub chapter: u32,
    pub scene: String,
    #[serde(skip)]
    pub audio_file: String,
    /// Rounded to two decimals
    pub audio_duration_sec: f64,
    pub recommended_frames: u32,
    pub current_frames: u32,
    #[serde(skip)]
    pub difference: i64,
    pub needs_update: bool,
}

/// Duration in seconds as reported by `ffprobe`
pub fn ffprobe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
        .arg(path)
        .output()?;
    if !output.status.success() {
        return Err(ReelError::Validation(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    let text = String::from_utf8_lossy(&output.stdout);
    text.trim().parse::<f64>().map_err(|_| {
        ReelError::Validation(format!("ffprobe returned no duration for {}", path.display()))
    })
}

/// Estimate from file size when no probe is available
pub fn estimate_duration(size_bytes: u64) -> f64 {
    size_bytes as f64 / 1024.0 / FALLBACK_KB_PER_SEC
}

pub fn duration_to_frames(seconds: f64) -> u32 {
    (seconds * FPS as f64).ceil() as u32
}

/// Analyze one entry against an audio file of known length
pub fn analyze_entry(entry: &NarrationEntry, seconds: f64) -> DurationAnalysis {
    let frames = duration_to_frames(seconds);
    let difference = frames as i64 - entry.duration_frames as i64;
    DurationAnalysis {
        id: entry.id.clone(),
        chapter: entry.chapter,
        scene: entry.scene.clone(),
        audio_file: entry.audio_filename(),
        audio_duration_sec: (seconds * 100.0).round() / 100.0,
        recommended_frames: frames,
        current_frames: entry.duration_frames,
        difference,
        needs_update: difference > 0,
    }
}

/// Analyze every entry whose audio exists in `audio_dir`
///
/// `probe` measures a file; when it fails the size estimate is used.
pub fn analyze<F>(entries: &[NarrationEntry], audio_dir: &Path, mut probe: F) -> Result<Vec<DurationAnalysis>>
where
    F: FnMut(&Path) -> Result<f64>,
{
    let mut results = Vec::new();
    for entry in entries {
        let path = audio_dir.join(entry.audio_filename());
        if !path.exists() {
            tracing::warn!("Audio file not found: {}", path.display());
            continue;
        }
        let seconds = match probe(&path) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!("Falling back to size estimate for {}: {}", path.display(), e);
                estimate_duration(std::fs::metadata(&path)?.len())
            }
        };
        results.push(analyze_entry(entry, seconds));
    }
    Ok(results)
}

pub fn by_chapter(results: &[DurationAnalysis]) -> BTreeMap<u32, Vec<&DurationAnalysis>> {
    let mut chapters: BTreeMap<u32, Vec<&DurationAnalysis>> = BTreeMap::new();
    for r in results {
        chapters.entry(r.chapter).or_default().push(r);
    }
    chapters
}

pub fn print_report(results: &[DurationAnalysis]) {
    let needs_update: Vec<&DurationAnalysis> = results.iter().filter(|r| r.needs_update).collect();

    println!();
    println!("========================================");
    println!("Audio Duration Analysis Report");
    println!("========================================");
    println!();
    println!("Total entries: {}", results.len());
    println!("OK (audio fits): {}", results.len() - needs_update.len());
    println!("Needs update (audio longer): {}", needs_update.len());

    for (chapter, rows) in by_chapter(results) {
        println!();
        println!("--- Chapter {} ---", chapter);
        for r in rows {
            let status = if r.needs_update { "✗ NEEDS UPDATE" } else { "✓ OK" };
            let diff = if r.difference > 0 {
                format!("+{}", r.difference)
            } else {
                r.difference.to_string()
            };
            println!(
                "  {:<25} | Audio: {:.1}s ({} frames) | Current: {} frames | Diff: {:>4} | {}",
                r.id, r.audio_duration_sec, r.recommended_frames, r.current_frames, diff, status
            );
        }
    }

    if !needs_update.is_empty() {
        println!();
        println!("========================================");
        println!("Required Updates");
        println!("========================================");
        for r in needs_update {
            println!(
                "{}: Change durationFrames from {} to {} (+{} frames, +{:.1}s)",
                r.id,
                r.current_frames,
                r.recommended_frames,
                r.difference,
                r.difference as f64 / FPS as f64
            );
        }
    }
}

/// Write the machine-readable analysis next to the narration audio
pub fn write_analysis(paths: &ProjectPaths, results: &[DurationAnalysis]) -> Result<std::path::PathBuf> {
    let path = paths.duration_analysis_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(results)?)?;
    Ok(path)
}

//! Word-level caption tracks (`captions.json`)
//!
//! Word times are in seconds from the start of the narration clip, as
//! returned by the speech-to-text service.

use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl CaptionWord {
    fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds < self.end
    }
}

/// Captions for one narration clip, keyed by the clip id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub id: String,
    pub words: Vec<CaptionWord>,
}

impl CaptionTrack {
    pub fn new(id: impl Into<String>, words: Vec<CaptionWord>) -> Self {
        Self {
            id: id.into(),
            words,
        }
    }

    /// Index of the word being spoken at a clip-local frame
    pub fn active_word(&self, frame: u32, fps: u32) -> Option<usize> {
        if fps == 0 {
            return None;
        }
        let seconds = frame as f64 / fps as f64;
        self.words.iter().position(|w| w.contains(seconds))
    }

    /// Number of words whose start time has been reached
    pub fn words_spoken(&self, frame: u32, fps: u32) -> usize {
        if fps == 0 {
            return 0;
        }
        let seconds = frame as f64 / fps as f64;
        self.words.iter().take_while(|w| w.start <= seconds).count()
    }

    /// End time of the last word, in seconds
    pub fn duration(&self) -> f64 {
        self.words.last().map(|w| w.end).unwrap_or(0.0)
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn load_captions(path: &Path) -> Result<Vec<CaptionTrack>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ReelError::Validation(format!("Failed to parse captions {}: {}", path.display(), e))
    })
}

pub fn save_captions(path: &Path, tracks: &[CaptionTrack]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(tracks)?;
    std::fs::write(path, json)?;
    Ok(())
}

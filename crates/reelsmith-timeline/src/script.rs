//! Hand-authored narration script (`narration-script.json`)

use crate::timing::{frames_to_seconds, FrameRange};
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Lead-in before the first line of a scene (0.5 s)
pub const PADDING_FRAMES: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationEntry {
    pub id: String,
    pub chapter: u32,
    pub scene: String,
    pub text: String,
    pub start_frame: u32,
    pub duration_frames: u32,
}

impl NarrationEntry {
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: self.start_frame,
            end: self.start_frame + self.duration_frames,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        frames_to_seconds(self.duration_frames)
    }

    /// File name of the generated audio for this entry
    pub fn audio_filename(&self) -> String {
        format!("{}.mp3", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NarrationScript {
    pub entries: Vec<NarrationEntry>,
}

impl NarrationScript {
    pub fn new(entries: Vec<NarrationEntry>) -> Self {
        Self { entries }
    }

    /// Load a script from a JSON array, rejecting duplicate ids
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let script: NarrationScript = serde_json::from_str(&content).map_err(|e| {
            ReelError::Validation(format!(
                "Failed to parse narration script {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut seen = HashSet::new();
        for entry in &script.entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(ReelError::Validation(format!(
                    "Duplicate narration id '{}' in {}",
                    entry.id,
                    path.display()
                )));
            }
        }
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&NarrationEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn for_chapter(&self, chapter: u32) -> Vec<&NarrationEntry> {
        self.entries.iter().filter(|e| e.chapter == chapter).collect()
    }

    /// Entries filtered by an optional chapter, in script order
    pub fn select(&self, chapter: Option<u32>) -> Vec<&NarrationEntry> {
        match chapter {
            Some(ch) => self.for_chapter(ch),
            None => self.entries.iter().collect(),
        }
    }

    /// Entry being spoken at a chapter-local frame
    pub fn active_at(&self, chapter: u32, frame: u32) -> Option<&NarrationEntry> {
        self.entries
            .iter()
            .find(|e| e.chapter == chapter && e.range().contains(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, chapter: u32, start: u32, duration: u32) -> NarrationEntry {
        NarrationEntry {
            id: id.to_string(),
            chapter,
            scene: "Introduction".to_string(),
            text: format!("Narration for {}", id),
            start_frame: start,
            duration_frames: duration,
        }
    }

    #[test]
    fn test_chapter_filter_keeps_order() {
        let script = NarrationScript::new(vec![
            entry("ch1-a", 1, PADDING_FRAMES, 285),
            entry("ch2-a", 2, PADDING_FRAMES, 285),
            entry("ch1-b", 1, 300, 300),
        ]);
        let ids: Vec<_> = script.for_chapter(1).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ch1-a", "ch1-b"]);
        assert_eq!(script.select(None).len(), 3);
        assert_eq!(script.select(Some(3)).len(), 0);
    }

    #[test]
    fn test_active_entry() {
        let script = NarrationScript::new(vec![
            entry("ch1-a", 1, 15, 285),
            entry("ch1-b", 1, 300, 300),
        ]);
        assert!(script.active_at(1, 0).is_none());
        assert_eq!(script.active_at(1, 299).map(|e| e.id.as_str()), Some("ch1-a"));
        assert_eq!(script.active_at(1, 300).map(|e| e.id.as_str()), Some("ch1-b"));
        assert!(script.active_at(2, 300).is_none());
    }

    #[test]
    fn test_load_rejects_duplicates() {
        let dir = std::env::temp_dir().join(format!("reelsmith_script_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("narration-script.json");

        let script = NarrationScript::new(vec![entry("a", 1, 0, 30), entry("b", 1, 30, 30)]);
        std::fs::write(&path, serde_json::to_string_pretty(&script).unwrap()).unwrap();
        let loaded = NarrationScript::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("b").unwrap().audio_filename(), "b.mp3");

        let dupes = NarrationScript::new(vec![entry("a", 1, 0, 30), entry("a", 2, 0, 30)]);
        std::fs::write(&path, serde_json::to_string(&dupes).unwrap()).unwrap();
        let err = NarrationScript::load(&path).unwrap_err();
        assert!(err.to_string().contains("Duplicate narration id 'a'"));

        std::fs::remove_dir_all(&dir).ok();
    }
}

//! Chapter definitions and their placement on the global timeline
//!
//! Chapters play back to back. In a transition series a fixed-length
//! cross-fade segment is inserted between each adjacent pair, so the total
//! length is the sum of chapter lengths plus `(n - 1) * transition_frames`.

use crate::timing::{section_ranges, FrameRange, FPS};
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSection {
    pub title: String,
    pub duration_frames: u32,
    #[serde(default)]
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDefinition {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub duration_frames: u32,
    #[serde(default)]
    pub color_key: String,
    #[serde(default)]
    pub sections: Vec<ChapterSection>,
    #[serde(default)]
    pub key_facts: Vec<String>,
    #[serde(default)]
    pub visual_cues: Vec<String>,
}

impl ChapterDefinition {
    pub fn duration_minutes(&self) -> f64 {
        self.duration_frames as f64 / FPS as f64 / 60.0
    }

    /// Section ranges relative to the start of the chapter
    pub fn section_ranges(&self) -> Vec<FrameRange> {
        let durations: Vec<u32> = self.sections.iter().map(|s| s.duration_frames).collect();
        section_ranges(&durations, 0)
    }
}

/// Load chapter definitions from a JSON array
pub fn load_chapters(path: &Path) -> Result<Vec<ChapterDefinition>> {
    let content = std::fs::read_to_string(path)?;
    let chapters: Vec<ChapterDefinition> = serde_json::from_str(&content).map_err(|e| {
        ReelError::Validation(format!("Failed to parse chapters {}: {}", path.display(), e))
    })?;
    validate_chapters(&chapters)?;
    Ok(chapters)
}

/// Reject zero-length chapters and sections that overrun their chapter
pub fn validate_chapters(chapters: &[ChapterDefinition]) -> Result<()> {
    for chapter in chapters {
        if chapter.duration_frames == 0 {
            return Err(ReelError::Validation(format!(
                "Chapter {} '{}' has zero duration",
                chapter.id, chapter.title
            )));
        }
        let sections: u32 = chapter.sections.iter().map(|s| s.duration_frames).sum();
        if sections > chapter.duration_frames {
            return Err(ReelError::Validation(format!(
                "Chapter {} sections total {} frames but the chapter is {} frames",
                chapter.id, sections, chapter.duration_frames
            )));
        }
    }
    Ok(())
}

/// Chapter containing a global frame when chapters play back to back with no
/// transitions. Frames past the end map to the last chapter.
pub fn chapter_at_frame(chapters: &[ChapterDefinition], frame: u32) -> Option<&ChapterDefinition> {
    let mut accumulated = 0;
    for chapter in chapters {
        if frame < accumulated + chapter.duration_frames {
            return Some(chapter);
        }
        accumulated += chapter.duration_frames;
    }
    chapters.last()
}

/// Where one chapter sits on the global timeline
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterPlacement {
    pub index: usize,
    pub chapter_id: u32,
    pub title: String,
    pub range: FrameRange,
}

/// What the renderer should show at a given frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePosition {
    Chapter {
        index: usize,
        local_frame: u32,
    },
    /// Cross-fade from chapter `from` into chapter `to`; `progress` runs 0..1
    Transition {
        from: usize,
        to: usize,
        progress: f64,
    },
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    placements: Vec<ChapterPlacement>,
    transition_frames: u32,
    total_frames: u32,
}

impl Timeline {
    /// Chapters back to back, no transitions
    pub fn sequential(chapters: &[ChapterDefinition]) -> Self {
        Self::with_transitions(chapters, 0)
    }

    /// Chapters separated by `transition_frames` of cross-fade
    pub fn with_transitions(chapters: &[ChapterDefinition], transition_frames: u32) -> Self {
        let mut placements = Vec::with_capacity(chapters.len());
        let mut cursor = 0u32;
        for (index, chapter) in chapters.iter().enumerate() {
            if index > 0 {
                cursor += transition_frames;
            }
            let range = FrameRange {
                start: cursor,
                end: cursor + chapter.duration_frames,
            };
            cursor = range.end;
            placements.push(ChapterPlacement {
                index,
                chapter_id: chapter.id,
                title: chapter.title.clone(),
                range,
            });
        }

        Self {
            placements,
            transition_frames,
            total_frames: cursor,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_frames as f64 / FPS as f64
    }

    pub fn transition_frames(&self) -> u32 {
        self.transition_frames
    }

    pub fn placements(&self) -> &[ChapterPlacement] {
        &self.placements
    }

    pub fn chapter_start(&self, index: usize) -> Option<u32> {
        self.placements.get(index).map(|p| p.range.start)
    }

    pub fn locate(&self, frame: u32) -> FramePosition {
        for (i, placement) in self.placements.iter().enumerate() {
            if placement.range.contains(frame) {
                return FramePosition::Chapter {
                    index: i,
                    local_frame: frame - placement.range.start,
                };
            }
            if let Some(next) = self.placements.get(i + 1) {
                if frame >= placement.range.end && frame < next.range.start {
                    let elapsed = frame - placement.range.end;
                    return FramePosition::Transition {
                        from: i,
                        to: i + 1,
                        progress: elapsed as f64 / self.transition_frames as f64,
                    };
                }
            }
        }
        FramePosition::End
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: u32, frames: u32) -> ChapterDefinition {
        ChapterDefinition {
            id,
            title: format!("Chapter {}", id),
            subtitle: String::new(),
            duration_frames: frames,
            color_key: format!("chapter{}", id),
            sections: vec![],
            key_facts: vec![],
            visual_cues: vec![],
        }
    }

    fn three_chapters() -> Vec<ChapterDefinition> {
        vec![chapter(1, 2700), chapter(2, 3600), chapter(3, 2700)]
    }

    #[test]
    fn test_total_with_transitions() {
        let timeline = Timeline::with_transitions(&three_chapters(), 30);
        assert_eq!(timeline.total_frames(), 2700 + 3600 + 2700 + 2 * 30);
        assert_eq!(timeline.chapter_start(1), Some(2730));
        assert_eq!(timeline.chapter_start(2), Some(6360));
    }

    #[test]
    fn test_sequential_total() {
        let timeline = Timeline::sequential(&three_chapters());
        assert_eq!(timeline.total_frames(), 9000);
        assert!((timeline.total_seconds() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_locate_frames() {
        let timeline = Timeline::with_transitions(&three_chapters(), 30);
        assert_eq!(
            timeline.locate(0),
            FramePosition::Chapter { index: 0, local_frame: 0 }
        );
        assert_eq!(
            timeline.locate(2715),
            FramePosition::Transition { from: 0, to: 1, progress: 0.5 }
        );
        assert_eq!(
            timeline.locate(2730),
            FramePosition::Chapter { index: 1, local_frame: 0 }
        );
        assert_eq!(timeline.locate(timeline.total_frames()), FramePosition::End);
    }

    #[test]
    fn test_locate_is_deterministic() {
        let timeline = Timeline::with_transitions(&three_chapters(), 30);
        for frame in [0, 1234, 2701, 6359, 9059] {
            assert_eq!(timeline.locate(frame), timeline.locate(frame));
        }
    }

    #[test]
    fn test_single_chapter_has_no_transition() {
        let timeline = Timeline::with_transitions(&[chapter(1, 100)], 30);
        assert_eq!(timeline.total_frames(), 100);
        assert_eq!(timeline.locate(100), FramePosition::End);
    }

    #[test]
    fn test_chapter_at_frame() {
        let chapters = three_chapters();
        assert_eq!(chapter_at_frame(&chapters, 0).map(|c| c.id), Some(1));
        assert_eq!(chapter_at_frame(&chapters, 2700).map(|c| c.id), Some(2));
        assert_eq!(chapter_at_frame(&chapters, 50_000).map(|c| c.id), Some(3));
        assert!(chapter_at_frame(&[], 0).is_none());
    }

    #[test]
    fn test_validate_rejects_overrunning_sections() {
        let mut ch = chapter(1, 100);
        ch.sections = vec![
            ChapterSection {
                title: "a".into(),
                duration_frames: 60,
                content: vec![],
            },
            ChapterSection {
                title: "b".into(),
                duration_frames: 60,
                content: vec![],
            },
        ];
        assert!(validate_chapters(&[ch.clone()]).is_err());
        ch.duration_frames = 120;
        assert!(validate_chapters(&[ch.clone()]).is_ok());
        assert_eq!(ch.section_ranges()[1].start, 60);
    }

    #[test]
    fn test_load_chapters_from_json() {
        let dir = std::env::temp_dir().join(format!("reelsmith_layout_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chapters.json");
        std::fs::write(
            &path,
            r#"[{"id":1,"title":"The Beginning","subtitle":"How It All Started",
                "durationFrames":2700,"colorKey":"chapter1",
                "sections":[{"title":"Introduction","durationFrames":900}]}]"#,
        )
        .unwrap();

        let chapters = load_chapters(&path).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].sections[0].duration_frames, 900);
        assert!((chapters[0].duration_minutes() - 1.5).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }
}

//! Frame rate, conversions and standard durations

/// Project frame rate
pub const FPS: u32 = 30;

/// Default cross-fade length between chapters, in frames
pub const CHAPTER_TRANSITION_FRAMES: u32 = 30;

/// Default stagger between consecutive items, in frames
pub const DEFAULT_STAGGER: u32 = 5;

/// Convert seconds to frames at [`FPS`], rounding to the nearest frame
pub fn seconds_to_frames(seconds: f64) -> u32 {
    (seconds * FPS as f64).round().max(0.0) as u32
}

/// Convert frames to seconds at [`FPS`]
pub fn frames_to_seconds(frames: u32) -> f64 {
    frames as f64 / FPS as f64
}

/// Named durations used across components (in frames)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub instant: u32,
    pub fast: u32,
    pub quick: u32,
    pub short: u32,
    pub medium: u32,
    pub normal: u32,
    pub long: u32,
    pub extended: u32,
    pub dramatic: u32,
    pub hold_short: u32,
    pub hold_medium: u32,
    pub hold_long: u32,
    pub chapter_transition: u32,
    pub title_card: u32,
}

impl Durations {
    pub fn standard() -> Self {
        Self {
            instant: 1,
            fast: seconds_to_frames(0.2),
            quick: seconds_to_frames(0.3),
            short: seconds_to_frames(0.5),
            medium: seconds_to_frames(0.8),
            normal: seconds_to_frames(1.0),
            long: seconds_to_frames(1.5),
            extended: seconds_to_frames(2.0),
            dramatic: seconds_to_frames(3.0),
            hold_short: seconds_to_frames(1.5),
            hold_medium: seconds_to_frames(3.0),
            hold_long: seconds_to_frames(5.0),
            chapter_transition: seconds_to_frames(1.5),
            title_card: seconds_to_frames(4.0),
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::standard()
    }
}

/// Start delay for the `index`-th item of a staggered group
pub fn stagger_delay(index: usize, amount: u32) -> u32 {
    index as u32 * amount
}

/// Half-open frame range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start && frame < self.end
    }
}

/// Lay out consecutive sections back to back starting at `start_frame`
pub fn section_ranges(durations: &[u32], start_frame: u32) -> Vec<FrameRange> {
    let mut current = start_frame;
    durations
        .iter()
        .map(|&d| {
            let range = FrameRange {
                start: current,
                end: current + d,
            };
            current = range.end;
            range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_frames_conversion() {
        assert_eq!(seconds_to_frames(1.0), 30);
        assert_eq!(seconds_to_frames(0.2), 6);
        assert_eq!(seconds_to_frames(1.5), 45);
        assert_eq!(seconds_to_frames(-2.0), 0);
        assert!((frames_to_seconds(45) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_standard_durations() {
        let d = Durations::standard();
        assert_eq!(d.instant, 1);
        assert_eq!(d.quick, 9);
        assert_eq!(d.title_card, 120);
        assert_eq!(d.chapter_transition, 45);
    }

    #[test]
    fn test_section_ranges_are_contiguous() {
        let ranges = section_ranges(&[900, 900, 900], 15);
        assert_eq!(ranges[0], FrameRange { start: 15, end: 915 });
        assert_eq!(ranges[2].end, 2715);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(ranges[1].contains(915));
        assert!(!ranges[1].contains(1815));
    }

    #[test]
    fn test_stagger_delay() {
        assert_eq!(stagger_delay(0, DEFAULT_STAGGER), 0);
        assert_eq!(stagger_delay(3, DEFAULT_STAGGER), 15);
    }
}

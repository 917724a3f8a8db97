//! Frame-driven visual effects: Ken Burns motion, entrances, fades, counters
//!
//! Every function here takes a frame number and returns plain numbers that a
//! renderer turns into CSS transforms or shader uniforms.

use crate::ease::Ease;
use crate::interpolate::{interpolate, Extrapolate};
use crate::spring::{delayed_spring, SpringConfig};
use crate::timing::{stagger_delay, FPS};
use serde::{Deserialize, Serialize};

/// Pan/zoom motion applied to a still image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KenBurns {
    #[default]
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    ZoomInPanLeft,
    ZoomInPanRight,
    ZoomOutPanLeft,
    ZoomOutPanRight,
    None,
}

/// Scale factor plus translation in percent of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };
}

// Pure pans are drawn slightly zoomed so the edges never show.
const PAN_SCALE: f64 = 1.1;

impl KenBurns {
    /// Transform at `frame` for an animation lasting `duration` frames.
    /// `intensity` in 0..=1 widens the zoom (5%..20%) and pan (3%..10%) range.
    pub fn transform(self, frame: u32, duration: u32, intensity: f64) -> Transform {
        let intensity = intensity.clamp(0.0, 1.0);
        let zoom = 0.05 + intensity * 0.15;
        let pan = 3.0 + intensity * 7.0;
        let p = if duration == 0 {
            1.0
        } else {
            (frame as f64 / duration as f64).min(1.0)
        };

        let zoom_in = 1.0 + p * zoom;
        let zoom_out = (1.0 + zoom) - p * zoom;
        let pan_neg = pan / 2.0 - p * pan;
        let pan_pos = -(pan / 2.0) + p * pan;
        let drift_neg = pan / 3.0 - p * (pan / 1.5);
        let drift_pos = -(pan / 3.0) + p * (pan / 1.5);

        let (scale, translate_x, translate_y) = match self {
            Self::ZoomIn => (zoom_in, 0.0, 0.0),
            Self::ZoomOut => (zoom_out, 0.0, 0.0),
            Self::PanLeft => (PAN_SCALE, pan_neg, 0.0),
            Self::PanRight => (PAN_SCALE, pan_pos, 0.0),
            Self::PanUp => (PAN_SCALE, 0.0, pan_neg),
            Self::PanDown => (PAN_SCALE, 0.0, pan_pos),
            Self::ZoomInPanLeft => (zoom_in, drift_neg, 0.0),
            Self::ZoomInPanRight => (zoom_in, drift_pos, 0.0),
            Self::ZoomOutPanLeft => (zoom_out, drift_neg, 0.0),
            Self::ZoomOutPanRight => (zoom_out, drift_pos, 0.0),
            Self::None => return Transform::IDENTITY,
        };
        Transform {
            scale,
            translate_x,
            translate_y,
        }
    }
}

/// Opacity, vertical offset (px) and scale of an element sliding in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrance {
    pub opacity: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub visible: bool,
}

/// Spring-driven entrance starting `delay` frames in
pub fn entrance(frame: u32, delay: u32, config: SpringConfig) -> Entrance {
    let local = frame as i64 - delay as i64;
    let progress = delayed_spring(frame as i64, delay, FPS, config);
    Entrance {
        opacity: interpolate(progress, &[0.0, 1.0], &[0.0, 1.0], Extrapolate::Clamp),
        translate_y: interpolate(progress, &[0.0, 1.0], &[30.0, 0.0], Extrapolate::Clamp),
        scale: interpolate(progress, &[0.0, 1.0], &[0.95, 1.0], Extrapolate::Clamp),
        visible: local >= 0,
    }
}

/// Entrances for `count` items, each delayed `stagger` frames after the previous
pub fn staggered_entrance(
    frame: u32,
    count: usize,
    start: u32,
    stagger: u32,
    config: SpringConfig,
) -> Vec<Entrance> {
    (0..count)
        .map(|i| entrance(frame, start + stagger_delay(i, stagger), config))
        .collect()
}

/// Opacity for an element visible over `[start, end)` that fades in over
/// `fade_in` frames and out over the last `fade_out` frames
pub fn fade_in_out(frame: u32, start: u32, end: u32, fade_in: u32, fade_out: u32) -> f64 {
    let local = frame as f64 - start as f64;
    let length = end.saturating_sub(start) as f64;
    let fade_in_value = if fade_in == 0 {
        1.0
    } else {
        interpolate(local, &[0.0, fade_in as f64], &[0.0, 1.0], Extrapolate::Clamp)
    };
    let fade_out_value = if fade_out == 0 {
        if local < length {
            1.0
        } else {
            0.0
        }
    } else {
        interpolate(
            local,
            &[length - fade_out as f64, length],
            &[1.0, 0.0],
            Extrapolate::Clamp,
        )
    };
    fade_in_value.min(fade_out_value)
}

/// Value of a counter animating from `from` to `to` over `duration` frames
/// after `delay`, with an out-cubic ease, rounded to `decimals` places
pub fn animated_counter(frame: u32, from: f64, to: f64, duration: u32, delay: u32, decimals: u32) -> f64 {
    let local = frame as f64 - delay as f64;
    let progress = if duration == 0 {
        if local >= 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (local / duration as f64).clamp(0.0, 1.0)
    };
    let raw = from + (to - from) * Ease::OutCubic.apply(progress);
    let factor = 10f64.powi(decimals as i32);
    (raw * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_in_runs_from_one_to_max() {
        let start = KenBurns::ZoomIn.transform(0, 300, 0.5);
        let end = KenBurns::ZoomIn.transform(300, 300, 0.5);
        assert_eq!(start.scale, 1.0);
        assert!((end.scale - 1.125).abs() < 1e-9);
        // holds after the duration
        assert_eq!(KenBurns::ZoomIn.transform(900, 300, 0.5), end);
    }

    #[test]
    fn pans_are_symmetric() {
        let left_start = KenBurns::PanLeft.transform(0, 100, 0.0);
        let left_end = KenBurns::PanLeft.transform(100, 100, 0.0);
        assert!((left_start.translate_x - 1.5).abs() < 1e-9);
        assert!((left_end.translate_x + 1.5).abs() < 1e-9);
        assert_eq!(left_start.scale, 1.1);
        let up = KenBurns::PanUp.transform(50, 100, 0.0);
        assert_eq!(up.translate_x, 0.0);
        assert!(up.translate_y.abs() < 1e-9);
    }

    #[test]
    fn none_is_identity() {
        assert_eq!(KenBurns::None.transform(42, 100, 1.0), Transform::IDENTITY);
    }

    #[test]
    fn entrance_before_delay_is_hidden() {
        let e = entrance(5, 10, SpringConfig::SMOOTH);
        assert!(!e.visible);
        assert_eq!(e.opacity, 0.0);
        assert_eq!(e.translate_y, 30.0);
        let late = entrance(600, 10, SpringConfig::SMOOTH);
        assert!(late.visible);
        assert!((late.opacity - 1.0).abs() < 1e-3);
    }

    #[test]
    fn staggered_items_lag_each_other() {
        let items = staggered_entrance(12, 3, 0, 5, SpringConfig::SNAPPY);
        assert_eq!(items.len(), 3);
        assert!(items[0].opacity > items[1].opacity);
        assert!(items[1].opacity > items[2].opacity);
    }

    #[test]
    fn fade_in_hold_fade_out() {
        assert_eq!(fade_in_out(0, 0, 300, 15, 15), 0.0);
        assert!((fade_in_out(7, 0, 300, 15, 15) - 7.0 / 15.0).abs() < 1e-9);
        assert_eq!(fade_in_out(150, 0, 300, 15, 15), 1.0);
        assert_eq!(fade_in_out(300, 0, 300, 15, 15), 0.0);
        // offset window
        assert_eq!(fade_in_out(100, 100, 400, 15, 15), 0.0);
    }

    #[test]
    fn counter_reaches_target() {
        assert_eq!(animated_counter(0, 0.0, 1000.0, 60, 10, 0), 0.0);
        assert_eq!(animated_counter(70, 0.0, 1000.0, 60, 10, 0), 1000.0);
        let mid = animated_counter(40, 0.0, 1000.0, 60, 10, 0);
        assert_eq!(mid, 875.0);
        assert_eq!(animated_counter(35, 0.0, 2.5, 50, 0, 1), 2.4);
    }
}

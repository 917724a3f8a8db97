//! Spring physics evaluated in closed form
//!
//! A unit mass-spring-damper released from rest at 0 and pulled toward 1.
//! Position at time `t` is computed analytically, so any frame can be sampled
//! independently of the others.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub damping: f64,
    pub stiffness: f64,
    pub mass: f64,
}

impl SpringConfig {
    /// Smooth and natural, no overshoot
    pub const SMOOTH: SpringConfig = SpringConfig {
        damping: 200.0,
        stiffness: 100.0,
        mass: 1.0,
    };
    pub const SNAPPY: SpringConfig = SpringConfig {
        damping: 20.0,
        stiffness: 200.0,
        mass: 0.5,
    };
    pub const BOUNCY: SpringConfig = SpringConfig {
        damping: 12.0,
        stiffness: 150.0,
        mass: 0.8,
    };
    pub const HEAVY: SpringConfig = SpringConfig {
        damping: 30.0,
        stiffness: 80.0,
        mass: 1.5,
    };
    pub const QUICK: SpringConfig = SpringConfig {
        damping: 200.0,
        stiffness: 300.0,
        mass: 0.5,
    };
    pub const GENTLE: SpringConfig = SpringConfig {
        damping: 200.0,
        stiffness: 50.0,
        mass: 1.0,
    };

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<SpringConfig> {
        match name {
            "smooth" => Some(Self::SMOOTH),
            "snappy" => Some(Self::SNAPPY),
            "bouncy" => Some(Self::BOUNCY),
            "heavy" => Some(Self::HEAVY),
            "quick" => Some(Self::QUICK),
            "gentle" => Some(Self::GENTLE),
            _ => None,
        }
    }

    fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::SMOOTH
    }
}

/// Spring progress at `frame`. Frames before 0 return 0.
pub fn spring(frame: i64, fps: u32, config: SpringConfig) -> f64 {
    if frame <= 0 || fps == 0 {
        return 0.0;
    }
    let t = frame as f64 / fps as f64;
    1.0 - displacement(t, &config)
}

/// Spring progress for an animation that starts `delay` frames in
pub fn delayed_spring(frame: i64, delay: u32, fps: u32, config: SpringConfig) -> f64 {
    spring(frame - delay as i64, fps, config)
}

// Remaining distance to the target, starting at 1 with zero velocity.
fn displacement(t: f64, config: &SpringConfig) -> f64 {
    let zeta = config.damping_ratio();
    let w0 = config.natural_frequency();

    if (zeta - 1.0).abs() < 1e-6 {
        (-w0 * t).exp() * (1.0 + w0 * t)
    } else if zeta < 1.0 {
        let wd = w0 * (1.0 - zeta * zeta).sqrt();
        (-zeta * w0 * t).exp() * ((wd * t).cos() + (zeta * w0 / wd) * (wd * t).sin())
    } else {
        // Two decaying exponentials; written this way to avoid cosh/sinh overflow
        // for strongly overdamped presets.
        let root = w0 * (zeta * zeta - 1.0).sqrt();
        let r1 = -zeta * w0 + root;
        let r2 = -zeta * w0 - root;
        let a = -r2 / (r1 - r2);
        let b = r1 / (r1 - r2);
        a * (r1 * t).exp() + b * (r2 * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::FPS;

    const PRESETS: [SpringConfig; 6] = [
        SpringConfig::SMOOTH,
        SpringConfig::SNAPPY,
        SpringConfig::BOUNCY,
        SpringConfig::HEAVY,
        SpringConfig::QUICK,
        SpringConfig::GENTLE,
    ];

    #[test]
    fn starts_at_zero_and_settles_at_one() {
        for config in PRESETS {
            assert_eq!(spring(0, FPS, config), 0.0);
            assert_eq!(spring(-10, FPS, config), 0.0);
            let settled = spring(60 * FPS as i64, FPS, config);
            assert!((settled - 1.0).abs() < 1e-3, "{:?} settled at {}", config, settled);
        }
    }

    #[test]
    fn overdamped_presets_are_finite_late() {
        let value = spring(10_000, FPS, SpringConfig::SMOOTH);
        assert!(value.is_finite());
    }

    #[test]
    fn bouncy_overshoots_smooth_does_not() {
        let max_of = |config| {
            (0..300)
                .map(|f| spring(f, FPS, config))
                .fold(f64::MIN, f64::max)
        };
        assert!(max_of(SpringConfig::BOUNCY) > 1.0);
        assert!(max_of(SpringConfig::SMOOTH) <= 1.0 + 1e-9);
    }

    #[test]
    fn same_frame_same_value() {
        for f in [1, 7, 33, 120] {
            assert_eq!(
                spring(f, FPS, SpringConfig::SNAPPY),
                spring(f, FPS, SpringConfig::SNAPPY)
            );
        }
    }

    #[test]
    fn delay_shifts_the_curve() {
        let direct = spring(10, FPS, SpringConfig::GENTLE);
        let delayed = delayed_spring(25, 15, FPS, SpringConfig::GENTLE);
        assert_eq!(direct, delayed);
        assert_eq!(delayed_spring(10, 15, FPS, SpringConfig::GENTLE), 0.0);
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(SpringConfig::preset("bouncy"), Some(SpringConfig::BOUNCY));
        assert_eq!(SpringConfig::preset("wobbly"), None);
    }
}

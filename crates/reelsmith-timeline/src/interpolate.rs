//! Piecewise-linear mapping between ranges

use crate::ease::Ease;

/// What happens outside the input range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolate {
    /// Hold the first/last output value
    #[default]
    Clamp,
    /// Continue the slope of the outermost segment
    Extend,
}

/// Map `value` through the piecewise-linear function defined by `input` and
/// `output` (same length, at least two points, `input` ascending).
///
/// Malformed ranges map everything to the first output value.
pub fn interpolate(value: f64, input: &[f64], output: &[f64], extrapolate: Extrapolate) -> f64 {
    if input.len() < 2 || input.len() != output.len() {
        return output.first().copied().unwrap_or(value);
    }

    let last = input.len() - 1;
    if extrapolate == Extrapolate::Clamp {
        if value <= input[0] {
            return output[0];
        }
        if value >= input[last] {
            return output[last];
        }
    }

    let segment = input
        .windows(2)
        .position(|w| value < w[1])
        .unwrap_or(last - 1);

    let (x0, x1) = (input[segment], input[segment + 1]);
    let (y0, y1) = (output[segment], output[segment + 1]);
    if x1 <= x0 {
        return y0;
    }
    y0 + (value - x0) / (x1 - x0) * (y1 - y0)
}

/// Clamped two-point interpolation with an easing curve applied to progress
pub fn interpolate_eased(value: f64, from: (f64, f64), to: (f64, f64), ease: Ease) -> f64 {
    let span = from.1 - from.0;
    if span <= 0.0 {
        return to.1;
    }
    let t = ease.apply((value - from.0) / span);
    to.0 + (to.1 - to.0) * t
}

//! Wave-height gradient across the distance profile.
//!
//! The slope is a two-point secant between the nearest and the farthest
//! point; intermediate distances do not influence it.

use crate::{GradientResult, Trend, WaveFrontPoint};

/// Slopes with a smaller magnitude are reported as stable, m/nm
pub const STABLE_THRESHOLD: f64 = 0.1;

/// Classify a slope in meters per nautical mile.
pub fn classify(slope: f64) -> Trend {
    if slope.abs() < STABLE_THRESHOLD {
        Trend::Stable
    } else if slope > 0.0 {
        Trend::Increasing
    } else {
        Trend::Decreasing
    }
}

/// Analyze points ordered by ascending distance.
pub fn analyze(points: &[WaveFrontPoint]) -> GradientResult {
    let stable = GradientResult {
        slope: 0.0,
        trend: Trend::Stable,
    };

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return stable;
    };
    let span = last.distance_nm - first.distance_nm;
    if points.len() < 2 || span <= 0.0 {
        return stable;
    }

    let slope = (last.wave_height - first.wave_height) / span;
    GradientResult {
        slope,
        trend: classify(slope),
    }
}

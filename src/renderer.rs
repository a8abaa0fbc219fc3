//! # Wave Front Terminal Rendering
//!
//! Renders a profile as a horizontal bar chart for terminal use: one bar per
//! offshore distance, followed by the trend, calibrated value and confidence.
//! Synthesized points are flagged so a simulated reading is never mistaken
//! for a measured one.

use crate::{Quality, Trend, WaveFrontProfile};
use std::fmt::Write;

/// Width of a bar representing `SCALE_MAX_M`
const BAR_WIDTH: usize = 40;
/// Height mapped to a full-width bar, meters
const SCALE_MAX_M: f64 = 5.0;

fn bar(height_m: f64) -> String {
    let filled = ((height_m / SCALE_MAX_M).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{:<width$}", "█".repeat(filled), width = BAR_WIDTH)
}

fn quality_label(quality: Quality) -> &'static str {
    match quality {
        Quality::High => "high",
        Quality::Medium => "medium",
        Quality::Low => "low",
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Increasing => "increasing offshore",
        Trend::Decreasing => "decreasing offshore",
        Trend::Stable => "stable",
    }
}

/// Render `profile` to a multi-line string.
pub fn render_ascii(profile: &WaveFrontProfile) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Wave front at {:.3}, {:.3}   {}",
        profile.coastal_point.latitude,
        profile.coastal_point.longitude,
        profile.timestamp.format("%Y-%m-%d %H:%M UTC")
    );

    if profile.measurements.iter().any(|p| p.is_fallback()) {
        let _ = writeln!(out, "⚠ FALLBACK: points marked * are simulated");
    }
    out.push('\n');

    for point in &profile.measurements {
        let marker = if point.is_fallback() { "*" } else { " " };
        let _ = writeln!(
            out,
            "{:>5.1} nm │{} {:>5.2} m {:<6}{} {}",
            point.distance_nm,
            bar(point.wave_height),
            point.wave_height,
            quality_label(point.quality),
            marker,
            point.provider_label
        );
    }
    let _ = writeln!(out, "         └{}", "─".repeat(BAR_WIDTH));

    let _ = writeln!(
        out,
        "Trend: {} ({:+.3} m/nm)   Calibrated: {:.2} m   Confidence: {:.0}%",
        trend_label(profile.gradient.trend),
        profile.gradient.slope,
        profile.calibrated_value,
        profile.confidence * 100.0
    );
    out
}

/// Render wave front data to ASCII terminal.
pub fn draw_ascii(profile: &WaveFrontProfile) {
    print!("{}", render_ascii(profile));
}

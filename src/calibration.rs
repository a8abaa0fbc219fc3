//! # Multi-Source Calibration
//!
//! Merges the measurements collected for one distance into a single
//! [`WaveFrontPoint`].
//!
//! ## Weighted mean
//! Each reading is weighted by its provider class (see
//! [`ProviderClass::weight`]). The weighted sum is divided by the sum of the
//! weights actually present, so a partial set of providers still yields a
//! proper mean and a single reading returns its own height unchanged.
//!
//! ## Local correction factors
//! Applied multiplicatively, in order:
//! 1. **Shore proximity**: ×0.85 under 2 nm, ×0.95 under 5 nm
//! 2. **Season**: ×1.15 in the southern winter (June to August, local time)
//! 3. **Latitude**: ×1.10 south of 30°S, where the coast is more exposed
//!
//! An empty measurement set never fails: it is handed to
//! [`fallback::synthesize`] instead.

use crate::fallback;
use crate::{GeoPoint, ProviderClass, Quality, WaveFrontPoint, WaveMeasurement};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

/// Latitude south of which the exposure correction applies
pub const EXPOSED_LATITUDE: f64 = -30.0;

/// Convert an instant to local wall-clock time for a fixed UTC offset.
pub fn local_time(at: DateTime<Utc>, utc_offset_hours: i32) -> NaiveDateTime {
    at.naive_utc() + chrono::Duration::hours(i64::from(utc_offset_hours))
}

/// June, July and August.
pub fn is_southern_winter(month: u32) -> bool {
    (6..=8).contains(&month)
}

/// December, January and February.
pub fn is_southern_summer(month: u32) -> bool {
    matches!(month, 12 | 1 | 2)
}

pub fn shore_factor(distance_nm: f64) -> f64 {
    if distance_nm < 2.0 {
        0.85
    } else if distance_nm < 5.0 {
        0.95
    } else {
        1.0
    }
}

pub fn seasonal_factor(month: u32) -> f64 {
    if is_southern_winter(month) {
        1.15
    } else {
        1.0
    }
}

pub fn latitude_factor(latitude: f64) -> f64 {
    if latitude < EXPOSED_LATITUDE {
        1.10
    } else {
        1.0
    }
}

/// Reliability-weighted mean height, `None` for an empty set.
pub fn weighted_height(measurements: &[WaveMeasurement]) -> Option<f64> {
    weighted_mean(measurements, |m| Some(m.wave_height))
}

fn weighted_mean<F>(measurements: &[WaveMeasurement], value: F) -> Option<f64>
where
    F: Fn(&WaveMeasurement) -> Option<f64>,
{
    let (sum, weight) = measurements
        .iter()
        .filter_map(|m| value(m).map(|v| (v, m.class.weight())))
        .fold((0.0, 0.0), |(sum, total), (v, w)| (sum + v * w, total + w));

    (weight > 0.0).then(|| sum / weight)
}

/// Weighted circular mean, so 350° and 10° average to 0° rather than 180°.
fn weighted_direction(measurements: &[WaveMeasurement]) -> Option<f64> {
    let (x, y, weight) = measurements
        .iter()
        .filter_map(|m| m.wave_direction.map(|d| (d.to_radians(), m.class.weight())))
        .fold((0.0, 0.0, 0.0), |(x, y, total), (rad, w)| {
            (x + rad.cos() * w, y + rad.sin() * w, total + w)
        });

    if weight == 0.0 || (x.abs() < 1e-12 && y.abs() < 1e-12) {
        return None;
    }
    Some(y.atan2(x).to_degrees().rem_euclid(360.0))
}

fn provider_label(measurements: &[WaveMeasurement]) -> String {
    let mut names: Vec<&str> = measurements.iter().map(|m| m.provider_name.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    let noun = if measurements.len() == 1 {
        "source"
    } else {
        "sources"
    };
    format!(
        "Calibrated ({} {}: {})",
        measurements.len(),
        noun,
        names.join(", ")
    )
}

/// Produces one calibrated point per distance.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationEngine {
    utc_offset_hours: i32,
}

impl CalibrationEngine {
    pub fn new(utc_offset_hours: i32) -> Self {
        Self { utc_offset_hours }
    }

    /// Calibrate `measurements` taken at `coordinate`, `distance_nm` offshore.
    ///
    /// `at` drives the seasonal factor and, for the fallback path, the
    /// time-of-day heuristic.
    pub fn calibrate(
        &self,
        measurements: &[WaveMeasurement],
        coordinate: GeoPoint,
        distance_nm: f64,
        at: DateTime<Utc>,
    ) -> WaveFrontPoint {
        let Some(mean) = weighted_height(measurements) else {
            return fallback::synthesize(coordinate, distance_nm, at, self.utc_offset_hours);
        };

        let month = local_time(at, self.utc_offset_hours).month();
        let wave_height = mean
            * shore_factor(distance_nm)
            * seasonal_factor(month)
            * latitude_factor(coordinate.latitude);

        let sources: Vec<ProviderClass> = measurements
            .iter()
            .map(|m| m.class)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        debug!(
            distance_nm,
            mean_m = mean,
            calibrated_m = wave_height,
            sources = measurements.len(),
            "Distance calibrated"
        );

        WaveFrontPoint {
            coordinate,
            distance_nm,
            wave_height,
            wave_period: weighted_mean(measurements, |m| m.wave_period),
            wave_direction: weighted_direction(measurements),
            provider_label: provider_label(measurements),
            sources,
            quality: Quality::High,
        }
    }
}

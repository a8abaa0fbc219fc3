//! # Wave Front Core Library
//!
//! This library computes a calibrated wave-height profile for a point on the
//! Chilean coast. Several independent wave-data providers are sampled at a
//! fixed set of offshore distances, their readings are merged with
//! reliability weights and local correction factors, and the resulting
//! distance profile is summarized as a gradient, a confidence score and a
//! single calibrated value.
//!
//! ## Data Flow
//! 1. **Project**: coastal point → one offshore point per configured distance
//! 2. **Sample**: every provider is queried concurrently for each offshore point
//! 3. **Calibrate**: successes are merged; an empty set triggers fallback synthesis
//! 4. **Summarize**: gradient, confidence and calibrated value over all points
//!
//! Provider failures never reach the caller. Missing data shows up only as
//! lower `quality` labels and a lower `confidence`.
//!
//! ## Core Types
//! - [`GeoPoint`]: an immutable coordinate
//! - [`WaveMeasurement`]: one provider reading, alive only inside a request
//! - [`WaveFrontPoint`]: one calibrated result per distance
//! - [`WaveFrontProfile`]: the aggregate returned to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod accounting;
pub mod calibration;
pub mod confidence;
pub mod config;
pub mod fallback;
pub mod gradient;
pub mod logging;
pub mod orchestrator;
pub mod profile;
pub mod projector;
pub mod renderer;
pub mod server;
pub mod sources;

#[cfg(test)]
mod tests;

/// A geographic coordinate in decimal degrees.
///
/// # Example
/// ```
/// use wave_front_lib::GeoPoint;
///
/// let valparaiso = GeoPoint::new(-33.03, -71.63);
/// assert_eq!(valparaiso.latitude, -33.03);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Data quality label attached to measurements and calibrated points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
}

/// Reliability class of a wave-data provider.
///
/// The class carries the weight used when merging readings, so adding a
/// provider means picking a class rather than touching the calibration code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderClass {
    /// High-resolution dynamic forecast, tracks short-term changes best
    Dynamic,
    /// Official oceanographic reanalysis
    OfficialReanalysis,
    /// Satellite-derived altimetry product
    Satellite,
    /// Global wave model output without assimilation
    Model,
    /// Anything without an established track record
    Unrated,
}

impl ProviderClass {
    /// Reliability weight used by the calibration weighted mean.
    pub fn weight(self) -> f64 {
        match self {
            ProviderClass::Dynamic => 0.50,
            ProviderClass::OfficialReanalysis => 0.25,
            ProviderClass::Satellite => 0.15,
            ProviderClass::Model => 0.10,
            ProviderClass::Unrated => 0.05,
        }
    }

    /// Classes backed by an official validation programme.
    pub fn is_officially_validated(self) -> bool {
        matches!(
            self,
            ProviderClass::OfficialReanalysis | ProviderClass::Satellite
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ProviderClass::Dynamic => "dynamic",
            ProviderClass::OfficialReanalysis => "reanalysis",
            ProviderClass::Satellite => "satellite",
            ProviderClass::Model => "model",
            ProviderClass::Unrated => "unrated",
        }
    }
}

impl fmt::Display for ProviderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single reading produced by one adapter attempt.
///
/// Never persisted: measurements exist only for the duration of one
/// orchestration call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaveMeasurement {
    pub latitude: f64,
    pub longitude: f64,
    /// Significant wave height in meters, always > 0
    pub wave_height: f64,
    /// Wave period in seconds
    pub wave_period: Option<f64>,
    /// Direction the waves come from, degrees in [0, 360)
    pub wave_direction: Option<f64>,
    pub provider_name: String,
    pub class: ProviderClass,
    pub timestamp: DateTime<Utc>,
    pub quality: Quality,
}

/// One calibrated result for a single offshore distance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaveFrontPoint {
    pub coordinate: GeoPoint,
    pub distance_nm: f64,
    pub wave_height: f64,
    pub wave_period: Option<f64>,
    pub wave_direction: Option<f64>,
    /// Human-readable summary of the contributing sources
    pub provider_label: String,
    /// Classes that contributed; empty when the point was synthesized
    pub sources: Vec<ProviderClass>,
    pub quality: Quality,
}

impl WaveFrontPoint {
    /// True when no provider contributed and the point was synthesized.
    pub fn is_fallback(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Spatial trend of wave height moving offshore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Wave-height slope across the distance profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientResult {
    /// Meters per nautical mile
    pub slope: f64,
    pub trend: Trend,
}

/// Root aggregate returned for every request.
///
/// Built fresh per request and immutable once returned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaveFrontProfile {
    pub coastal_point: GeoPoint,
    /// One point per configured distance, ascending by `distance_nm`
    pub measurements: Vec<WaveFrontPoint>,
    pub gradient: GradientResult,
    /// Meters, always within [1.0, 4.0]
    pub calibrated_value: f64,
    /// Always within [0.1, 1.0]
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

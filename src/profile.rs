//! # Wave Front Profile Assembly
//!
//! Entry point of the engine. For a coastal coordinate the service projects
//! one offshore point per configured distance, samples and calibrates every
//! distance concurrently, and assembles the result with its gradient,
//! confidence and calibrated value.
//!
//! The service never fails. Unreachable providers only lower point quality
//! and confidence.

use crate::accounting::CallAccounting;
use crate::calibration::CalibrationEngine;
use crate::config::{sanitize_distances, Config};
use crate::orchestrator::Orchestrator;
use crate::sources::{build_sources, http_client};
use crate::{confidence, gradient, projector};
use crate::{GeoPoint, GradientResult, Trend, WaveFrontPoint, WaveFrontProfile};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

/// Bounds for the calibrated value, meters
pub const MIN_CALIBRATED_M: f64 = 1.0;
pub const MAX_CALIBRATED_M: f64 = 4.0;

/// Slope below which waves are considered to be building offshore, m/nm
const BUILDING_OFFSHORE_SLOPE: f64 = -0.2;

/// Nearshore nudge applied when waves build further out, meters
const BUILDING_OFFSHORE_NUDGE_M: f64 = 0.1;

/// Headline value: the nearest-shore height, nudged up when the profile
/// falls steeply offshore, clamped to [1.0, 4.0] m.
pub fn calibrated_value(points: &[WaveFrontPoint], gradient: &GradientResult) -> f64 {
    let Some(nearest) = points.first() else {
        return MIN_CALIBRATED_M;
    };

    let mut value = nearest.wave_height;
    if gradient.trend == Trend::Decreasing && gradient.slope < BUILDING_OFFSHORE_SLOPE {
        value += BUILDING_OFFSHORE_NUDGE_M;
    }
    value.clamp(MIN_CALIBRATED_M, MAX_CALIBRATED_M)
}

/// Compose calibrated points, ordered by distance, into a profile.
pub fn assemble(
    coastal_point: GeoPoint,
    measurements: Vec<WaveFrontPoint>,
    timestamp: DateTime<Utc>,
) -> WaveFrontProfile {
    let gradient = gradient::analyze(&measurements);
    let confidence = confidence::score(&measurements);
    let calibrated_value = calibrated_value(&measurements, &gradient);

    WaveFrontProfile {
        coastal_point,
        measurements,
        gradient,
        calibrated_value,
        confidence,
        timestamp,
    }
}

pub struct WaveFrontService {
    orchestrator: Orchestrator,
    engine: CalibrationEngine,
    distances: Vec<f64>,
}

impl WaveFrontService {
    pub fn new(orchestrator: Orchestrator, engine: CalibrationEngine, distances: &[f64]) -> Self {
        Self {
            orchestrator,
            engine,
            distances: sanitize_distances(distances),
        }
    }

    /// Wire the full provider set from configuration.
    pub fn from_config(
        config: &Config,
        accounting: Arc<dyn CallAccounting>,
    ) -> reqwest::Result<Self> {
        let deadline = config.engine.adapter_deadline();
        let client = http_client(deadline)?;
        let sources = build_sources(&config.sources, client, Arc::clone(&accounting));
        let orchestrator = Orchestrator::new(sources, deadline, accounting);
        let engine = CalibrationEngine::new(config.engine.utc_offset_hours());

        Ok(Self::new(orchestrator, engine, &config.engine.distances()))
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Profile for a coastal coordinate at the current instant.
    pub async fn profile(&self, latitude: f64, longitude: f64) -> WaveFrontProfile {
        self.profile_at(GeoPoint::new(latitude, longitude), Utc::now())
            .await
    }

    /// Profile evaluated as of `at`.
    pub async fn profile_at(&self, coast: GeoPoint, at: DateTime<Utc>) -> WaveFrontProfile {
        let per_distance = self.distances.iter().map(|&distance_nm| async move {
            let offshore = projector::offshore_point(coast, distance_nm);
            let measurements = self.orchestrator.sample(offshore, distance_nm).await;
            self.engine
                .calibrate(&measurements, offshore, distance_nm, at)
        });

        // join_all keeps input order, so points stay ascending by distance
        let points = join_all(per_distance).await;
        let profile = assemble(coast, points, at);

        info!(
            lat = coast.latitude,
            lon = coast.longitude,
            calibrated_m = profile.calibrated_value,
            confidence = profile.confidence,
            trend = ?profile.gradient.trend,
            "Wave front profile computed"
        );
        profile
    }
}

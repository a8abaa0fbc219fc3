//! # Wave Data Source Adapters
//!
//! One adapter per upstream provider. Every adapter turns a coordinate into a
//! single [`WaveMeasurement`] or a typed [`SourceError`]; nothing escapes the
//! adapter boundary as a panic, and every attempt is reported to the injected
//! [`CallAccounting`].
//!
//! | Adapter | Provider | Class |
//! |---------|----------|-------|
//! | [`StormglassSource`] | Stormglass point forecast | `Dynamic` |
//! | [`CopernicusSource`] | Copernicus Marine proxy | `OfficialReanalysis` |
//! | [`NoaaSatelliteSource`] | NOAA altimetry proxy | `Satellite` |
//! | [`OpenMeteoSource`] | Open-Meteo marine model | `Model` |
//! | [`CoastalBuoySource`] | Coastal buoy service | `Unrated` |
//!
//! Each adapter keeps its response parsing in a pure `parse_*` function so
//! the wire format can be tested without a network.

mod buoy;
mod copernicus;
mod noaa;
mod open_meteo;
mod stormglass;

pub use buoy::CoastalBuoySource;
pub use copernicus::CopernicusSource;
pub use noaa::NoaaSatelliteSource;
pub use open_meteo::OpenMeteoSource;
pub use stormglass::StormglassSource;

use crate::accounting::{CallAccounting, CallLedger};
use crate::config::SourcesConfig;
use crate::{GeoPoint, ProviderClass, Quality, WaveMeasurement};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Tallest significant wave height accepted as physically plausible, meters
pub const MAX_PLAUSIBLE_HEIGHT_M: f64 = 25.0;

/// Longest wave period accepted, seconds
pub const MAX_PLAUSIBLE_PERIOD_S: f64 = 30.0;

/// Failure modes of a single adapter attempt.
///
/// All variants are handled the same way by the orchestrator: the attempt
/// yields no measurement.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network failure, HTTP error status, or deadline exceeded
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response body missing or malformed expected numeric fields
    #[error("malformed response: {0}")]
    Format(String),

    /// Pre-flight quota check refused the call
    #[error("daily quota exhausted for {0}")]
    QuotaExceeded(String),

    /// Value outside the sane physical range
    #[error("implausible value: {0}")]
    Plausibility(String),
}

impl SourceError {
    /// Short label used as the accounting endpoint for refused or failed calls.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Transport(_) => "transport",
            SourceError::Format(_) => "format",
            SourceError::QuotaExceeded(_) => "quota",
            SourceError::Plausibility(_) => "plausibility",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Format(e.to_string())
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Format(e.to_string())
    }
}

/// A pluggable wave-data provider.
///
/// Implementors must be stateless per call so the orchestrator can run them
/// concurrently against the same coordinate.
pub trait WaveSource: Send + Sync {
    /// Provider name used in logs, labels and accounting.
    fn name(&self) -> &str;

    /// Reliability class that determines the provider's weight.
    fn class(&self) -> ProviderClass;

    /// Produce one measurement for `point`.
    fn fetch(&self, point: GeoPoint) -> BoxFuture<'_, Result<WaveMeasurement, SourceError>>;
}

/// Numeric fields extracted from a provider response, before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawReading {
    pub height: Option<f64>,
    pub period: Option<f64>,
    pub direction: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Apply the shared plausibility rules and build a measurement.
///
/// A missing height is a format failure; a non-positive or absurd height is a
/// plausibility failure. Out-of-range period and direction values are dropped
/// rather than failing the whole reading.
pub fn validate_reading(
    provider: &str,
    class: ProviderClass,
    point: GeoPoint,
    reading: RawReading,
    quality: Quality,
) -> Result<WaveMeasurement, SourceError> {
    let height = reading
        .height
        .ok_or_else(|| SourceError::Format(format!("{provider}: no wave height in response")))?;

    if !height.is_finite() || height <= 0.0 || height > MAX_PLAUSIBLE_HEIGHT_M {
        return Err(SourceError::Plausibility(format!(
            "{provider}: wave height {height} m"
        )));
    }

    let wave_period = reading
        .period
        .filter(|p| p.is_finite() && *p > 0.0 && *p <= MAX_PLAUSIBLE_PERIOD_S);
    let wave_direction = reading
        .direction
        .filter(|d| d.is_finite())
        .map(|d| d.rem_euclid(360.0));

    Ok(WaveMeasurement {
        latitude: point.latitude,
        longitude: point.longitude,
        wave_height: height,
        wave_period,
        wave_direction,
        provider_name: provider.to_string(),
        class,
        timestamp: reading.observed_at.unwrap_or_else(Utc::now),
        quality,
    })
}

/// Report an attempt to accounting and the log.
///
/// Accounting is infallible by contract, so this never affects `result`.
pub(crate) fn report(
    accounting: &dyn CallAccounting,
    provider: &str,
    endpoint: &str,
    result: &Result<WaveMeasurement, SourceError>,
) {
    match result {
        Ok(measurement) => {
            debug!(
                provider,
                height_m = measurement.wave_height,
                "Wave measurement received"
            );
            accounting.record(provider, endpoint, true);
        }
        Err(e) => {
            warn!(provider, kind = e.kind(), "Wave source failed: {}", e);
            accounting.record(provider, endpoint, false);
        }
    }
}

/// Shared HTTP client for all adapters.
///
/// The client timeout matches the orchestrator deadline so a slow upstream is
/// cut off at the transport layer as well.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("wave-front/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Ledger with the daily quotas declared in the provider table.
pub fn ledger_for(config: &SourcesConfig) -> CallLedger {
    let quotas = [
        (stormglass::NAME, config.stormglass.daily_quota),
        (copernicus::NAME, config.copernicus.daily_quota),
        (noaa::NAME, config.noaa.daily_quota),
        (open_meteo::NAME, config.open_meteo.daily_quota),
        (buoy::NAME, config.buoy.daily_quota),
    ];

    quotas
        .into_iter()
        .fold(CallLedger::new(), |ledger, (name, quota)| match quota {
            Some(limit) => ledger.with_quota(name, limit),
            None => ledger,
        })
}

/// Construct every enabled adapter.
pub fn build_sources(
    config: &SourcesConfig,
    client: reqwest::Client,
    accounting: Arc<dyn CallAccounting>,
) -> Vec<Arc<dyn WaveSource>> {
    let mut sources: Vec<Arc<dyn WaveSource>> = Vec::new();

    if config.stormglass.enabled {
        match &config.stormglass.api_key {
            Some(key) => sources.push(Arc::new(StormglassSource::new(
                client.clone(),
                &config.stormglass.base_url,
                key,
                Arc::clone(&accounting),
            ))),
            None => warn!("Stormglass enabled but no API key configured, skipping"),
        }
    }
    if config.copernicus.enabled {
        sources.push(Arc::new(CopernicusSource::new(
            client.clone(),
            &config.copernicus.base_url,
            Arc::clone(&accounting),
        )));
    }
    if config.noaa.enabled {
        sources.push(Arc::new(NoaaSatelliteSource::new(
            client.clone(),
            &config.noaa.base_url,
            Arc::clone(&accounting),
        )));
    }
    if config.open_meteo.enabled {
        sources.push(Arc::new(OpenMeteoSource::new(
            client.clone(),
            &config.open_meteo.base_url,
            Arc::clone(&accounting),
        )));
    }
    if config.buoy.enabled {
        sources.push(Arc::new(CoastalBuoySource::new(
            client,
            &config.buoy.base_url,
            accounting,
        )));
    }

    debug!(count = sources.len(), "Wave sources registered");
    sources
}

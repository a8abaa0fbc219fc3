//! NOAA satellite altimetry adapter.
//!
//! Queries a proxy that interpolates along-track altimeter passes (Jason-3,
//! Sentinel-6) to the requested point. Altimetry measures height only; period
//! and direction are filled from the co-located WAVEWATCH field when the proxy
//! has it. Readings interpolated from a distant pass are downgraded.

use super::{report, validate_reading, RawReading, SourceError, WaveSource};
use crate::accounting::CallAccounting;
use crate::{GeoPoint, ProviderClass, Quality, WaveMeasurement};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const NAME: &str = "noaa";
const ENDPOINT: &str = "altimetry";

/// Passes further than this from the point are treated as low quality, km
const MAX_TRACK_DISTANCE_KM: f64 = 50.0;

#[derive(Debug, Deserialize)]
struct NoaaResponse {
    significant_wave_height: Option<f64>,
    dominant_period: Option<f64>,
    mean_wave_direction: Option<f64>,
    observed_at: Option<DateTime<Utc>>,
    track_distance_km: Option<f64>,
}

/// Parse the proxy response into a reading and the quality it deserves.
pub fn parse_noaa(body: &[u8]) -> Result<(RawReading, Quality), SourceError> {
    let response: NoaaResponse = serde_json::from_slice(body)?;

    let quality = match response.track_distance_km {
        Some(km) if km > MAX_TRACK_DISTANCE_KM => Quality::Low,
        _ => Quality::Medium,
    };

    Ok((
        RawReading {
            height: response.significant_wave_height,
            period: response.dominant_period,
            direction: response.mean_wave_direction,
            observed_at: response.observed_at,
        },
        quality,
    ))
}

pub struct NoaaSatelliteSource {
    client: reqwest::Client,
    base_url: String,
    accounting: Arc<dyn CallAccounting>,
}

impl NoaaSatelliteSource {
    pub fn new(client: reqwest::Client, base_url: &str, accounting: Arc<dyn CallAccounting>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            accounting,
        }
    }

    async fn request(&self, point: GeoPoint) -> Result<WaveMeasurement, SourceError> {
        if !self.accounting.try_acquire(NAME) {
            return Err(SourceError::QuotaExceeded(NAME.to_string()));
        }

        let body = self
            .client
            .get(&self.base_url)
            .query(&[("lat", point.latitude), ("lon", point.longitude)])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let (reading, quality) = parse_noaa(&body)?;
        validate_reading(NAME, ProviderClass::Satellite, point, reading, quality)
    }
}

impl WaveSource for NoaaSatelliteSource {
    fn name(&self) -> &str {
        NAME
    }

    fn class(&self) -> ProviderClass {
        ProviderClass::Satellite
    }

    fn fetch(&self, point: GeoPoint) -> BoxFuture<'_, Result<WaveMeasurement, SourceError>> {
        Box::pin(async move {
            let result = self.request(point).await;
            report(self.accounting.as_ref(), NAME, ENDPOINT, &result);
            result
        })
    }
}

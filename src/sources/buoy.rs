//! Coastal buoy adapter.
//!
//! Asks a buoy network service for the latest observation from the station
//! nearest to the point. Field names follow the NDBC standard meteorological
//! format (`WVHT`, `DPD`, `MWD`). Quality falls off with station distance and
//! observation age.

use super::{report, validate_reading, RawReading, SourceError, WaveSource};
use crate::accounting::CallAccounting;
use crate::{GeoPoint, ProviderClass, Quality, WaveMeasurement};
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const NAME: &str = "coastal-buoy";
const ENDPOINT: &str = "latest";

#[derive(Debug, Deserialize)]
struct BuoyResponse {
    station: Option<String>,
    distance_km: Option<f64>,
    observation: Option<BuoyObservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct BuoyObservation {
    wvht: Option<f64>,
    dpd: Option<f64>,
    mwd: Option<f64>,
    #[serde(rename = "time")]
    time: Option<DateTime<Utc>>,
}

fn grade(distance_km: Option<f64>, age: Option<Duration>) -> Quality {
    let stale = age.is_some_and(|a| a > Duration::hours(6));
    match distance_km {
        _ if stale => Quality::Low,
        Some(km) if km <= 25.0 => Quality::High,
        Some(km) if km <= 100.0 => Quality::Medium,
        _ => Quality::Low,
    }
}

pub fn parse_buoy(body: &[u8], now: DateTime<Utc>) -> Result<(RawReading, Quality), SourceError> {
    let response: BuoyResponse = serde_json::from_slice(body)?;
    let observation = response.observation.ok_or_else(|| {
        SourceError::Format(format!(
            "coastal-buoy: station {} has no observation",
            response.station.as_deref().unwrap_or("unknown")
        ))
    })?;

    let age = observation.time.map(|t| now - t);
    let quality = grade(response.distance_km, age);

    Ok((
        RawReading {
            height: observation.wvht,
            period: observation.dpd,
            direction: observation.mwd,
            observed_at: observation.time,
        },
        quality,
    ))
}

pub struct CoastalBuoySource {
    client: reqwest::Client,
    base_url: String,
    accounting: Arc<dyn CallAccounting>,
}

impl CoastalBuoySource {
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

        let (reading, quality) = parse_buoy(&body, Utc::now())?;
        validate_reading(NAME, ProviderClass::Unrated, point, reading, quality)
    }
}

impl WaveSource for CoastalBuoySource {
    fn name(&self) -> &str {
        NAME
    }

    fn class(&self) -> ProviderClass {
        ProviderClass::Unrated
    }

    fn fetch(&self, point: GeoPoint) -> BoxFuture<'_, Result<WaveMeasurement, SourceError>> {
        Box::pin(async move {
            let result = self.request(point).await;
            report(self.accounting.as_ref(), NAME, ENDPOINT, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_close_fresh_station() {
        let body = br#"{"station": "VALPO-1", "distance_km": 8.5,
            "observation": {"WVHT": 1.6, "DPD": 11.0, "MWD": 255, "time": "2025-07-01T11:30:00Z"}}"#;
        let (reading, quality) = parse_buoy(body, now()).unwrap();
        assert_eq!(reading.height, Some(1.6));
        assert_eq!(reading.direction, Some(255.0));
        assert_eq!(quality, Quality::High);
    }

    #[test]
    fn test_quality_grading() {
        assert_eq!(grade(Some(60.0), None), Quality::Medium);
        assert_eq!(grade(Some(300.0), None), Quality::Low);
        assert_eq!(grade(None, None), Quality::Low);
        assert_eq!(grade(Some(5.0), Some(Duration::hours(12))), Quality::Low);
    }

    #[test]
    fn test_missing_observation() {
        let err = parse_buoy(br#"{"station": "X", "distance_km": 3.0}"#, now()).unwrap_err();
        assert!(matches!(err, SourceError::Format(_)));
    }
}

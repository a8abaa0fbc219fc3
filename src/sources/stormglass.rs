//! Stormglass point forecast adapter.
//!
//! The highest-weighted provider: a blended high-resolution forecast that
//! tracks short-term swell changes best. The free tier is limited to a handful
//! of calls per day, so every call is preceded by a quota check.

use super::{report, validate_reading, RawReading, SourceError, WaveSource};
use crate::accounting::CallAccounting;
use crate::{GeoPoint, ProviderClass, Quality, WaveMeasurement};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) const NAME: &str = "stormglass";
const ENDPOINT: &str = "weather/point";

/// Stormglass' own blended model, preferred over the per-agency values
const PREFERRED_MODEL: &str = "sg";

#[derive(Debug, Deserialize)]
struct StormglassResponse {
    #[serde(default)]
    hours: Vec<StormglassHour>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StormglassHour {
    time: DateTime<Utc>,
    #[serde(default)]
    wave_height: HashMap<String, Option<f64>>,
    #[serde(default)]
    wave_period: HashMap<String, Option<f64>>,
    #[serde(default)]
    wave_direction: HashMap<String, Option<f64>>,
}

/// Pick the preferred model's value, or any model that reported one.
fn pick(values: &HashMap<String, Option<f64>>) -> Option<f64> {
    values
        .get(PREFERRED_MODEL)
        .copied()
        .flatten()
        .or_else(|| {
            let mut models: Vec<_> = values.iter().collect();
            models.sort_by(|a, b| a.0.cmp(b.0));
            models.into_iter().find_map(|(_, v)| *v)
        })
}

/// Parse a `/weather/point` response, using the hour closest to `now`.
pub fn parse_stormglass(body: &[u8], now: DateTime<Utc>) -> Result<RawReading, SourceError> {
    let response: StormglassResponse = serde_json::from_slice(body)?;

    let hour = response
        .hours
        .iter()
        .filter(|h| pick(&h.wave_height).is_some())
        .min_by_key(|h| (h.time - now).num_seconds().abs())
        .ok_or_else(|| SourceError::Format("stormglass: no hourly wave heights".to_string()))?;

    Ok(RawReading {
        height: pick(&hour.wave_height),
        period: pick(&hour.wave_period),
        direction: pick(&hour.wave_direction),
        observed_at: Some(hour.time),
    })
}

pub struct StormglassSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    accounting: Arc<dyn CallAccounting>,
}

impl StormglassSource {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        accounting: Arc<dyn CallAccounting>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            accounting,
        }
    }

    async fn request(&self, point: GeoPoint) -> Result<WaveMeasurement, SourceError> {
        if !self.accounting.try_acquire(NAME) {
            return Err(SourceError::QuotaExceeded(NAME.to_string()));
        }

        let now = Utc::now();
        let start = now.timestamp().to_string();
        let end = (now + chrono::Duration::hours(1)).timestamp().to_string();
        let body = self
            .client
            .get(&self.base_url)
            .header("Authorization", &self.api_key)
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lng", point.longitude.to_string()),
                ("params", "waveHeight,wavePeriod,waveDirection".to_string()),
                ("start", start),
                ("end", end),
            ])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let reading = parse_stormglass(&body, now)?;
        validate_reading(NAME, ProviderClass::Dynamic, point, reading, Quality::High)
    }
}

impl WaveSource for StormglassSource {
    fn name(&self) -> &str {
        NAME
    }

    fn class(&self) -> ProviderClass {
        ProviderClass::Dynamic
    }

    fn fetch(&self, point: GeoPoint) -> BoxFuture<'_, Result<WaveMeasurement, SourceError>> {
        Box::pin(async move {
            let result = self.request(point).await;
            let endpoint = match &result {
                Err(SourceError::QuotaExceeded(_)) => "quota",
                _ => ENDPOINT,
            };
            report(self.accounting.as_ref(), NAME, endpoint, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::CallLedger;
    use chrono::TimeZone;

    const BODY: &str = r#"{
        "hours": [
            {
                "time": "2025-07-01T12:00:00+00:00",
                "waveHeight": {"sg": 2.4, "noaa": 2.2},
                "wavePeriod": {"sg": 12.5},
                "waveDirection": {"noaa": 245.0}
            },
            {
                "time": "2025-07-01T13:00:00+00:00",
                "waveHeight": {"sg": 2.6},
                "wavePeriod": {"sg": 12.0},
                "waveDirection": {"sg": 250.0}
            }
        ],
        "meta": {"cost": 1, "dailyQuota": 10}
    }"#;

    #[test]
    fn test_parse_picks_nearest_hour() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 10, 0).unwrap();
        let reading = parse_stormglass(BODY.as_bytes(), now).unwrap();
        assert_eq!(reading.height, Some(2.4));
        assert_eq!(reading.period, Some(12.5));
        // Falls back to another model when "sg" is absent
        assert_eq!(reading.direction, Some(245.0));

        let later = Utc.with_ymd_and_hms(2025, 7, 1, 12, 50, 0).unwrap();
        let reading = parse_stormglass(BODY.as_bytes(), later).unwrap();
        assert_eq!(reading.height, Some(2.6));
    }

    #[test]
    fn test_parse_without_hours_is_format_error() {
        let now = Utc::now();
        let err = parse_stormglass(br#"{"hours": []}"#, now).unwrap_err();
        assert!(matches!(err, SourceError::Format(_)));

        let err = parse_stormglass(b"<html>rate limited</html>", now).unwrap_err();
        assert!(matches!(err, SourceError::Format(_)));
    }

    #[test]
    fn test_null_model_values_are_skipped() {
        let body = br#"{"hours": [{"time": "2025-07-01T12:00:00Z",
            "waveHeight": {"sg": null, "icon": 1.9}}]}"#;
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let reading = parse_stormglass(body, now).unwrap();
        assert_eq!(reading.height, Some(1.9));
        assert_eq!(reading.period, None);
    }

    #[tokio::test]
    async fn test_exhausted_quota_short_circuits_and_is_recorded() {
        let ledger = Arc::new(CallLedger::new().with_quota(NAME, 0));
        let source = StormglassSource::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/unreachable",
            "key",
            ledger.clone(),
        );

        let err = source
            .fetch(GeoPoint::new(-33.0, -71.7))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::QuotaExceeded(_)));

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.providers[NAME].endpoints["quota"].failure, 1);
    }
}

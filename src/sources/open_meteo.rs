//! Open-Meteo marine model adapter.
//!
//! Free, keyless, and always available, but pure model output without data
//! assimilation, hence the low weight. The API returns parallel hourly arrays
//! with `null` gaps; the adapter uses the hour nearest to "now" that has a
//! height.

use super::{report, validate_reading, RawReading, SourceError, WaveSource};
use crate::accounting::CallAccounting;
use crate::{GeoPoint, ProviderClass, Quality, WaveMeasurement};
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const NAME: &str = "open-meteo";
const ENDPOINT: &str = "marine";

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: Option<MarineHourly>,
}

#[derive(Debug, Deserialize)]
struct MarineHourly {
    time: Vec<String>,
    #[serde(default)]
    wave_height: Vec<Option<f64>>,
    #[serde(default)]
    wave_period: Vec<Option<f64>>,
    #[serde(default)]
    wave_direction: Vec<Option<f64>>,
}

/// Open-Meteo returns ISO times without seconds or offset when `timezone=GMT`.
fn parse_hour(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn parse_open_meteo(body: &[u8], now: DateTime<Utc>) -> Result<RawReading, SourceError> {
    let response: MarineResponse = serde_json::from_slice(body)?;
    let hourly = response
        .hourly
        .ok_or_else(|| SourceError::Format("open-meteo: missing hourly block".to_string()))?;

    let (index, time) = hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| parse_hour(raw).map(|t| (i, t)))
        .filter(|(i, _)| hourly.wave_height.get(*i).copied().flatten().is_some())
        .min_by_key(|(_, t)| (*t - now).num_seconds().abs())
        .ok_or_else(|| SourceError::Format("open-meteo: no hourly wave heights".to_string()))?;

    let at = |series: &[Option<f64>]| series.get(index).copied().flatten();

    Ok(RawReading {
        height: at(hourly.wave_height.as_slice()),
        period: at(hourly.wave_period.as_slice()),
        direction: at(hourly.wave_direction.as_slice()),
        observed_at: Some(time),
    })
}

pub struct OpenMeteoSource {
    client: reqwest::Client,
    base_url: String,
    accounting: Arc<dyn CallAccounting>,
}

impl OpenMeteoSource {
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
            .query(&[
                ("latitude", point.latitude.to_string()),
                ("longitude", point.longitude.to_string()),
                ("hourly", "wave_height,wave_period,wave_direction".to_string()),
                ("timezone", "GMT".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let reading = parse_open_meteo(&body, Utc::now())?;
        validate_reading(NAME, ProviderClass::Model, point, reading, Quality::Medium)
    }
}

impl WaveSource for OpenMeteoSource {
    fn name(&self) -> &str {
        NAME
    }

    fn class(&self) -> ProviderClass {
        ProviderClass::Model
    }

    fn fetch(&self, point: GeoPoint) -> BoxFuture<'_, Result<WaveMeasurement, SourceError>> {
        Box::pin(async move {
            let result = self.request(point).await;
            report(self.accounting.as_ref(), NAME, ENDPOINT, &result);
            result
        })
    }
}

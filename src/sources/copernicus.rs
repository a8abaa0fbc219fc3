//! Copernicus Marine reanalysis adapter.
//!
//! Queries a small proxy in front of the CMEMS global wave product. The proxy
//! answers with the raw CMEMS variable names:
//!
//! - `VHM0`: spectral significant wave height (m)
//! - `VTPK`: peak wave period (s)
//! - `VMDR`: mean wave direction, coming-from (deg)

use super::{report, validate_reading, RawReading, SourceError, WaveSource};
use crate::accounting::CallAccounting;
use crate::{GeoPoint, ProviderClass, Quality, WaveMeasurement};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

pub(crate) const NAME: &str = "copernicus";
const ENDPOINT: &str = "waves";

#[derive(Debug, Deserialize)]
struct CopernicusResponse {
    #[serde(rename = "VHM0")]
    vhm0: Option<f64>,
    #[serde(rename = "VTPK")]
    vtpk: Option<f64>,
    #[serde(rename = "VMDR")]
    vmdr: Option<f64>,
    time: Option<DateTime<Utc>>,
    /// Set by the proxy when the upstream query failed
    error: Option<String>,
}

pub fn parse_copernicus(body: &[u8]) -> Result<RawReading, SourceError> {
    let response: CopernicusResponse = serde_json::from_slice(body)?;

    if let Some(message) = response.error {
        return Err(SourceError::Transport(format!("copernicus proxy: {message}")));
    }

    Ok(RawReading {
        height: response.vhm0,
        period: response.vtpk,
        direction: response.vmdr,
        observed_at: response.time,
    })
}

pub struct CopernicusSource {
    client: reqwest::Client,
    base_url: String,
    accounting: Arc<dyn CallAccounting>,
}

impl CopernicusSource {
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

        let reading = parse_copernicus(&body)?;
        validate_reading(
            NAME,
            ProviderClass::OfficialReanalysis,
            point,
            reading,
            Quality::High,
        )
    }
}

impl WaveSource for CopernicusSource {
    fn name(&self) -> &str {
        NAME
    }

    fn class(&self) -> ProviderClass {
        ProviderClass::OfficialReanalysis
    }

    fn fetch(&self, point: GeoPoint) -> BoxFuture<'_, Result<WaveMeasurement, SourceError>> {
        Box::pin(async move {
            let result = self.request(point).await;
            report(self.accounting.as_ref(), NAME, ENDPOINT, &result);
            result
        })
    }
}

//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the wave-config.toml file.
//! It provides a centralized way to configure the sampled distances, local time handling,
//! the per-adapter deadline, upstream provider endpoints and the HTTP bind address.
//!
//! Every section is optional in the file; missing sections and fields take their
//! defaults, so a file containing only an API key is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "wave-config.toml";

/// Environment variable that supplies the dynamic provider's API key
pub const STORMGLASS_KEY_ENV: &str = "STORMGLASS_API_KEY";

/// Distances used when the configured list is empty or invalid
const DEFAULT_DISTANCES_NM: [f64; 3] = [1.0, 2.0, 5.0];

/// Application configuration loaded from wave-config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Calibration engine settings
    pub engine: EngineConfig,
    /// Upstream wave-data providers
    pub sources: SourcesConfig,
    /// HTTP endpoint settings
    pub server: ServerConfig,
}

/// Calibration engine settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Offshore sampling distances in nautical miles
    pub distances_nm: Vec<f64>,
    /// Offset of local time from UTC in hours (Chile: -4, -3 in summer)
    pub utc_offset_hours: i32,
    /// Hard deadline for a single adapter call in seconds
    pub adapter_deadline_secs: u64,
}

/// Per-provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Disabled providers are never registered with the orchestrator
    pub enabled: bool,
    /// Endpoint the adapter queries
    pub base_url: String,
    /// Credential for providers that require one
    pub api_key: Option<String>,
    /// Maximum calls per UTC day, unlimited when absent
    pub daily_quota: Option<u32>,
}

/// The full provider table
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub stormglass: SourceConfig,
    pub copernicus: SourceConfig,
    pub noaa: SourceConfig,
    pub open_meteo: SourceConfig,
    pub buoy: SourceConfig,
}

/// HTTP endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the server listens on
    pub bind: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            distances_nm: DEFAULT_DISTANCES_NM.to_vec(),
            utc_offset_hours: -4,
            adapter_deadline_secs: 8,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            enabled: true,
            base_url: String::new(),
            api_key: None,
            daily_quota: None,
        }
    }
}

impl SourceConfig {
    fn with_url(base_url: &str) -> Self {
        SourceConfig {
            base_url: base_url.to_string(),
            ..SourceConfig::default()
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            stormglass: SourceConfig {
                // Free tier allows 10 requests per day
                daily_quota: Some(10),
                ..SourceConfig::with_url("https://api.stormglass.io/v2/weather/point")
            },
            copernicus: SourceConfig::with_url("http://127.0.0.1:8090/api/copernicus/waves"),
            noaa: SourceConfig::with_url("http://127.0.0.1:8090/api/noaa/waves"),
            open_meteo: SourceConfig::with_url("https://marine-api.open-meteo.com/v1/marine"),
            buoy: SourceConfig::with_url("http://127.0.0.1:8090/api/buoy/latest"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl EngineConfig {
    /// Configured distances, see [`sanitize_distances`].
    pub fn distances(&self) -> Vec<f64> {
        sanitize_distances(&self.distances_nm)
    }

    /// Local time offset in hours, clamped to the valid -12..=14 range.
    pub fn utc_offset_hours(&self) -> i32 {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            warn!(
                offset_hours = self.utc_offset_hours,
                "UTC offset out of range, clamping"
            );
        }
        self.utc_offset_hours.clamp(-12, 14)
    }

    pub fn adapter_deadline(&self) -> Duration {
        Duration::from_secs(self.adapter_deadline_secs.max(1))
    }
}

/// Sort distances ascending and drop invalid and duplicate entries.
///
/// Falls back to 1/2/5 nm when nothing usable remains.
pub fn sanitize_distances(distances_nm: &[f64]) -> Vec<f64> {
    let mut distances: Vec<f64> = distances_nm
        .iter()
        .copied()
        .filter(|d| d.is_finite() && *d > 0.0)
        .collect();
    distances.sort_by(f64::total_cmp);
    distances.dedup();

    if distances.is_empty() {
        warn!("No usable offshore distances configured, using 1/2/5 nm");
        return DEFAULT_DISTANCES_NM.to_vec();
    }
    distances
}

impl Config {
    /// Load configuration from wave-config.toml in the working directory
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.as_ref().display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    /// Fill credentials from the environment when the file does not provide them.
    pub fn apply_env(&mut self) {
        if self.sources.stormglass.api_key.is_none() {
            if let Ok(key) = std::env::var(STORMGLASS_KEY_ENV) {
                if !key.trim().is_empty() {
                    self.sources.stormglass.api_key = Some(key.trim().to_string());
                }
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "Configuration saved");
        Ok(())
    }
}

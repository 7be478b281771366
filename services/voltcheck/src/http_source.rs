//! Sample source backed by a JSON battery telemetry endpoint
//!
//! The endpoint reports raw platform values: current in µA or mA (sign
//! depends on the vendor), voltage in mV, temperature in tenths of a degree.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::io::HttpClient;
use crate::sample::{Sample, SampleSource};

/// Raw value platforms report when a property is unsupported
const UNSUPPORTED: i64 = i32::MIN as i64;

/// Raw current magnitudes above this are microamps
const MICROAMP_CUTOFF: u64 = 10_000;

/// Battery status as reported by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Charging,
    Full,
    Discharging,
    NotCharging,
    #[serde(other)]
    Unknown,
}

impl ChargeStatus {
    pub fn is_charging(self) -> bool {
        matches!(self, ChargeStatus::Charging | ChargeStatus::Full)
    }
}

/// Telemetry payload returned by the endpoint
///
/// Platforms report 32-bit integer properties, so wider values fail to parse.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBatteryReading {
    #[serde(default)]
    pub current_now: Option<i32>,
    #[serde(default)]
    pub current_average: Option<i32>,
    #[serde(default)]
    pub voltage_mv: i32,
    #[serde(default)]
    pub temperature_decicelsius: i32,
    #[serde(default)]
    pub level: i32,
    #[serde(default = "default_scale")]
    pub scale: i32,
    pub status: ChargeStatus,
}

fn default_scale() -> i32 {
    100
}

/// Convert a raw current property to a mA magnitude.
///
/// Returns `None` for the unsupported marker and for 0, which platforms
/// report when the instantaneous value is not available.
pub fn normalize_current(raw: i64) -> Option<f64> {
    if raw == UNSUPPORTED || raw == 0 {
        return None;
    }
    let milliamps = if raw.unsigned_abs() > MICROAMP_CUTOFF {
        raw as f64 / 1000.0
    } else {
        raw as f64
    };
    Some(milliamps.abs())
}

impl RawBatteryReading {
    /// Current in mA, falling back to the average when the instant value is missing
    pub fn current_ma(&self) -> f64 {
        let normalized = |raw: Option<i32>| raw.and_then(|raw| normalize_current(raw.into()));
        normalized(self.current_now)
            .or_else(|| normalized(self.current_average))
            .unwrap_or(0.0)
    }

    pub fn level_pct(&self) -> u8 {
        if self.scale <= 0 {
            return 0;
        }
        (i64::from(self.level) * 100 / i64::from(self.scale)).clamp(0, 100) as u8
    }

    pub fn to_sample(&self) -> Sample {
        Sample::new(
            self.current_ma(),
            self.voltage_mv as f64 / 1000.0,
            self.temperature_decicelsius as f64 / 10.0,
            self.level_pct(),
            self.status.is_charging(),
        )
    }
}

/// Polls a telemetry endpoint for battery samples
pub struct HttpSampleSource {
    name: String,
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpSampleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSampleSource")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}

impl HttpSampleSource {
    pub fn new(config: &SourceConfig, http: Arc<dyn HttpClient>) -> Self {
        let SourceConfig::Http { url } = config;

        tracing::debug!("Created HttpSampleSource at {}", url);

        Self {
            name: "http".to_string(),
            url: url.clone(),
            http,
        }
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_sample(&self) -> Sample {
        let response = match self.http.get(&self.url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Failed to read sample from {}: {}", self.url, e);
                return Sample::unavailable();
            }
        };

        if !response.is_success() {
            tracing::debug!(
                "Non-200 response from {}: status={}",
                self.url,
                response.status
            );
            return Sample::unavailable();
        }

        match serde_json::from_str::<RawBatteryReading>(&response.body) {
            Ok(raw) => raw.to_sample(),
            Err(e) => {
                tracing::debug!("Failed to parse sample from {}: {}", self.url, e);
                Sample::unavailable()
            }
        }
    }
}

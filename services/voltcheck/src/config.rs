//! Configuration types for the voltcheck service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::alert::AlertKind;

/// Service configuration, loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Battery design capacity, enables the time-to-full estimate
    #[serde(default)]
    pub design_capacity_mah: Option<u32>,
}

impl Config {
    /// Reject values the sampling core cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.sampling.interval_ms == 0 {
            return Err(crate::VoltcheckError::Config(
                "sampling.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.sampling.log_every == 0 {
            return Err(crate::VoltcheckError::Config(
                "sampling.log_every must be greater than 0".to_string(),
            ));
        }
        if self.test.duration_seconds == 0 {
            return Err(crate::VoltcheckError::Config(
                "test.duration_seconds must be greater than 0".to_string(),
            ));
        }
        self.thresholds.validate()
    }
}

/// Sample source configuration, tagged for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceConfig {
    #[serde(rename = "http")]
    Http {
        #[serde(default = "default_source_url")]
        url: String,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Http {
            url: default_source_url(),
        }
    }
}

/// Cadence of the continuous monitoring loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Every n-th sample is appended to the raw sample log
    #[serde(default = "default_log_every")]
    pub log_every: u32,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Notify when the charger is plugged in or removed
    #[serde(default)]
    pub notify_charger_changes: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            log_every: default_log_every(),
            log_capacity: default_log_capacity(),
            notify_charger_changes: false,
        }
    }
}

/// Alert thresholds, snapshotted once per evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_low_current")]
    pub low_current_ma: f64,
    #[serde(default = "default_high_temperature")]
    pub high_temperature_c: f64,
    /// Minimum acceptable stability in percent
    #[serde(default = "default_stability")]
    pub stability_pct: f64,
    #[serde(default = "default_full_charge_level")]
    pub full_charge_level: u8,
    #[serde(default)]
    pub alarm_enabled: bool,
    #[serde(default)]
    pub alerts: AlertToggles,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            low_current_ma: default_low_current(),
            high_temperature_c: default_high_temperature(),
            stability_pct: default_stability(),
            full_charge_level: default_full_charge_level(),
            alarm_enabled: false,
            alerts: AlertToggles::default(),
        }
    }
}

impl ThresholdConfig {
    /// Whether alerts of `kind` may be emitted at all
    pub fn kind_enabled(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::LowCurrent => self.alerts.low_current,
            AlertKind::HighTemperature => self.alerts.high_temperature,
            AlertKind::UnstableCharging => self.alerts.unstable_charging,
            AlertKind::FullChargeAlarm => self.alarm_enabled,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=100.0).contains(&self.stability_pct) {
            return Err(crate::VoltcheckError::Config(format!(
                "thresholds.stability_pct must be within 0-100, got {}",
                self.stability_pct
            )));
        }
        if self.full_charge_level > 100 {
            return Err(crate::VoltcheckError::Config(format!(
                "thresholds.full_charge_level must be within 0-100, got {}",
                self.full_charge_level
            )));
        }
        if self.low_current_ma < 0.0 {
            return Err(crate::VoltcheckError::Config(format!(
                "thresholds.low_current_ma must not be negative, got {}",
                self.low_current_ma
            )));
        }
        Ok(())
    }
}

/// Per-kind alert switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertToggles {
    #[serde(default = "default_true")]
    pub low_current: bool,
    #[serde(default = "default_true")]
    pub high_temperature: bool,
    /// Older settings files store this under the fast charging toggle
    #[serde(default = "default_true", alias = "fast_charging")]
    pub unstable_charging: bool,
}

impl Default for AlertToggles {
    fn default() -> Self {
        Self {
            low_current: true,
            high_temperature: true,
            unstable_charging: true,
        }
    }
}

/// Charger test run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    #[serde(default = "default_test_duration")]
    pub duration_seconds: u64,
    /// Samples needed before a manually stopped test is analyzed
    #[serde(default = "default_min_manual_samples")]
    pub min_manual_samples: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_test_duration(),
            min_manual_samples: default_min_manual_samples(),
        }
    }
}

/// Where alert notifications are delivered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "pushover")]
    Pushover {
        api_token: String,
        user_key: String,
        #[serde(default = "default_pushover_title")]
        default_title: String,
        #[serde(default)]
        default_priority: i8,
        #[serde(default = "default_pushover_sound")]
        default_sound: String,
    },
    #[serde(rename = "log")]
    Log,
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Pushover { .. } => "pushover",
            NotifierConfig::Log => "log",
        }
    }
}

/// Session result store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Status API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            history_size: default_history_size(),
        }
    }
}

fn default_source_url() -> String {
    "http://localhost:11120/battery".to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_log_every() -> u32 {
    10
}

fn default_log_capacity() -> usize {
    1000
}

fn default_low_current() -> f64 {
    500.0
}

fn default_high_temperature() -> f64 {
    45.0
}

fn default_stability() -> f64 {
    80.0
}

fn default_full_charge_level() -> u8 {
    100
}

fn default_test_duration() -> u64 {
    60
}

fn default_min_manual_samples() -> usize {
    10
}

fn default_pushover_title() -> String {
    "Charging Alert".to_string()
}

fn default_pushover_sound() -> String {
    "pushover".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("sessions.json")
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11116
}

fn default_history_size() -> usize {
    100
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::VoltcheckError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

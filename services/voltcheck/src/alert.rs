//! Threshold alerting with per-kind cooldowns
//!
//! Alerts are only evaluated while charging. The full-charge alarm is a
//! one-shot latch per charge cycle; the other kinds repeat at most once per
//! [`ALERT_COOLDOWN`].

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::sample::Sample;
use crate::stability::{StabilityReading, StabilityStage};

/// Minimum time between two alerts of the same kind
pub const ALERT_COOLDOWN: Duration = Duration::from_millis(60_000);

/// The kinds of alert the engine can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowCurrent,
    HighTemperature,
    UnstableCharging,
    FullChargeAlarm,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::LowCurrent => write!(f, "Low current"),
            AlertKind::HighTemperature => write!(f, "High temperature"),
            AlertKind::UnstableCharging => write!(f, "Unstable charging"),
            AlertKind::FullChargeAlarm => write!(f, "Full charge alarm"),
        }
    }
}

/// An alert raised for one sample, carrying the measurement that caused it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertEvent {
    LowCurrent { current_ma: f64 },
    HighTemperature { temperature_c: f64 },
    UnstableCharging { cv: f64 },
    FullChargeAlarm { level: u8 },
}

impl AlertEvent {
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertEvent::LowCurrent { .. } => AlertKind::LowCurrent,
            AlertEvent::HighTemperature { .. } => AlertKind::HighTemperature,
            AlertEvent::UnstableCharging { .. } => AlertKind::UnstableCharging,
            AlertEvent::FullChargeAlarm { .. } => AlertKind::FullChargeAlarm,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertEvent::LowCurrent { .. } => "Low Charging Current",
            AlertEvent::HighTemperature { .. } => "High Battery Temperature",
            AlertEvent::UnstableCharging { .. } => "Unstable Charging",
            AlertEvent::FullChargeAlarm { .. } => "Battery Alarm",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AlertEvent::LowCurrent { current_ma } => format!(
                "Current is only {:.0} mA. Check your charger and cable.",
                current_ma
            ),
            AlertEvent::HighTemperature { temperature_c } => format!(
                "Temperature reached {:.1}°C. Unplug the charger to let it cool down.",
                temperature_c
            ),
            AlertEvent::UnstableCharging { cv } => format!(
                "Charging current is fluctuating ({:.1}% variation). Check the charger connection.",
                cv
            ),
            AlertEvent::FullChargeAlarm { level } => format!("Battery reached {}%", level),
        }
    }
}

/// Full-charge alarm state within one charge cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FullChargeLatch {
    #[default]
    Armed,
    Fired,
}

/// Last-fired times per alert kind on the monotonic clock
#[derive(Debug, Clone)]
pub struct AlertCooldowns {
    last_fired: HashMap<AlertKind, Instant>,
    cooldown: Duration,
}

impl Default for AlertCooldowns {
    fn default() -> Self {
        Self::new(ALERT_COOLDOWN)
    }
}

impl AlertCooldowns {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_fired: HashMap::new(),
            cooldown,
        }
    }

    /// True if `kind` has never fired or its cooldown has fully elapsed
    pub fn ready(&self, kind: AlertKind, now: Instant) -> bool {
        match self.last_fired.get(&kind) {
            Some(last) => now.saturating_duration_since(*last) > self.cooldown,
            None => true,
        }
    }

    pub fn record(&mut self, kind: AlertKind, now: Instant) {
        self.last_fired.insert(kind, now);
    }

    pub fn last_fired(&self, kind: AlertKind) -> Option<Instant> {
        self.last_fired.get(&kind).copied()
    }
}

/// Evaluates each charging sample against the configured thresholds
#[derive(Debug, Clone, Default)]
pub struct ThresholdAlertEngine {
    stability: StabilityStage,
    cooldowns: AlertCooldowns,
    latch: FullChargeLatch,
    last_stability: StabilityReading,
}

impl ThresholdAlertEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one sample and return the alerts it raises.
    ///
    /// A sample taken while not charging re-arms the full-charge alarm and
    /// raises nothing.
    pub fn evaluate(
        &mut self,
        sample: &Sample,
        thresholds: &ThresholdConfig,
        now: Instant,
    ) -> Vec<AlertEvent> {
        if !sample.charging {
            if self.latch == FullChargeLatch::Fired {
                tracing::debug!("Charging stopped, re-arming full charge alarm");
            }
            self.latch = FullChargeLatch::Armed;
            return Vec::new();
        }

        let mut events = Vec::new();

        if thresholds.kind_enabled(AlertKind::FullChargeAlarm)
            && sample.level >= thresholds.full_charge_level
            && self.latch == FullChargeLatch::Armed
        {
            self.latch = FullChargeLatch::Fired;
            events.push(AlertEvent::FullChargeAlarm {
                level: sample.level,
            });
        }

        if sample.current_ma > 0.0
            && sample.current_ma < thresholds.low_current_ma
            && thresholds.kind_enabled(AlertKind::LowCurrent)
            && self.cooldowns.ready(AlertKind::LowCurrent, now)
        {
            self.cooldowns.record(AlertKind::LowCurrent, now);
            events.push(AlertEvent::LowCurrent {
                current_ma: sample.current_ma,
            });
        }

        if sample.temperature_c > thresholds.high_temperature_c
            && thresholds.kind_enabled(AlertKind::HighTemperature)
            && self.cooldowns.ready(AlertKind::HighTemperature, now)
        {
            self.cooldowns.record(AlertKind::HighTemperature, now);
            events.push(AlertEvent::HighTemperature {
                temperature_c: sample.temperature_c,
            });
        }

        let reading = self
            .stability
            .observe(sample.current_ma, thresholds.stability_pct);
        self.last_stability = reading;
        if reading.ready
            && reading.is_unstable
            && thresholds.kind_enabled(AlertKind::UnstableCharging)
            && self.cooldowns.ready(AlertKind::UnstableCharging, now)
        {
            self.cooldowns.record(AlertKind::UnstableCharging, now);
            events.push(AlertEvent::UnstableCharging { cv: reading.cv });
        }

        for event in &events {
            tracing::debug!("Alert raised: {:?}", event);
        }

        events
    }

    pub fn latch(&self) -> FullChargeLatch {
        self.latch
    }

    /// Stability reading from the most recent charging sample
    pub fn last_stability(&self) -> StabilityReading {
        self.last_stability
    }
}

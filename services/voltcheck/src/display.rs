//! Values published for the presentation layer on every tick

use serde::Serialize;

use crate::sample::Sample;
use crate::smoothing::SmoothingStage;

/// What a display shows for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayReading {
    /// Smoothed current, negative while discharging
    pub current_ma: f64,
    pub raw_current_ma: f64,
    pub voltage_v: f64,
    pub temperature_c: f64,
    pub level: u8,
    pub charging: bool,
    pub power_w: f64,
    /// Lowest and highest displayed current since monitoring started
    pub min_current_ma: f64,
    pub max_current_ma: f64,
    pub time_to_full_minutes: Option<u32>,
    pub timestamp_epoch_ms: u64,
}

/// Smooths the current and tracks session extremes for display
#[derive(Debug, Clone)]
pub struct DisplayTracker {
    smoothing: SmoothingStage,
    min_current_ma: f64,
    max_current_ma: f64,
    design_capacity_mah: Option<u32>,
}

impl DisplayReading {
    pub fn status_label(&self) -> &'static str {
        if self.charging {
            "Charging"
        } else {
            "Not charging"
        }
    }
}

impl DisplayTracker {
    pub fn new(design_capacity_mah: Option<u32>) -> Self {
        Self {
            smoothing: SmoothingStage::new(),
            min_current_ma: f64::INFINITY,
            max_current_ma: f64::NEG_INFINITY,
            design_capacity_mah,
        }
    }

    pub fn observe(&mut self, sample: &Sample, timestamp_epoch_ms: u64) -> DisplayReading {
        let smoothed = self.smoothing.observe(sample.current_ma);
        let current_ma = if sample.charging { smoothed } else { -smoothed };
        self.min_current_ma = self.min_current_ma.min(current_ma);
        self.max_current_ma = self.max_current_ma.max(current_ma);

        let time_to_full_minutes = self
            .design_capacity_mah
            .filter(|_| sample.charging)
            .and_then(|capacity| time_to_full_minutes(capacity, sample.level, smoothed));

        DisplayReading {
            current_ma,
            raw_current_ma: sample.current_ma,
            voltage_v: sample.voltage_v,
            temperature_c: sample.temperature_c,
            level: sample.level,
            charging: sample.charging,
            power_w: sample.voltage_v * smoothed / 1000.0,
            min_current_ma: self.min_current_ma,
            max_current_ma: self.max_current_ma,
            time_to_full_minutes,
            timestamp_epoch_ms,
        }
    }
}

/// Minutes until full at the given charging current, if it can be estimated
pub fn time_to_full_minutes(design_capacity_mah: u32, level: u8, current_ma: f64) -> Option<u32> {
    if current_ma <= 0.0 || level >= 100 {
        return None;
    }
    let remaining_mah = f64::from(design_capacity_mah) * f64::from(100 - level) / 100.0;
    Some((remaining_mah / current_ma * 60.0) as u32)
}

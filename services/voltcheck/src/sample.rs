//! Sample type and the source trait that produces samples

use async_trait::async_trait;
use std::time::Instant;

/// One instantaneous reading of the charging circuit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Current magnitude in mA
    pub current_ma: f64,
    pub voltage_v: f64,
    pub temperature_c: f64,
    /// Charge level, 0-100
    pub level: u8,
    pub charging: bool,
    pub timestamp: Instant,
}

impl Sample {
    pub fn new(
        current_ma: f64,
        voltage_v: f64,
        temperature_c: f64,
        level: u8,
        charging: bool,
    ) -> Self {
        Self {
            current_ma: current_ma.abs(),
            voltage_v,
            temperature_c,
            level: level.min(100),
            charging,
            timestamp: Instant::now(),
        }
    }

    /// Zero-valued stand-in used when the sensor cannot be read
    pub fn unavailable() -> Self {
        Self::new(0.0, 0.0, 0.0, 0, false)
    }
}

/// Trait for reading samples from the charging hardware.
///
/// Reads never fail: an unreadable sensor yields [`Sample::unavailable`]
/// so that monitoring keeps running.
#[async_trait]
pub trait SampleSource: Send + Sync + std::fmt::Debug {
    /// Get the source name
    fn name(&self) -> &str;

    /// Take one reading
    async fn read_sample(&self) -> Sample;
}

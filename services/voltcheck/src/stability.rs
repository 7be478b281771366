//! Charging stability classification from current variation

use serde::Serialize;

use crate::stats;
use crate::window::SlidingWindow;

/// Number of raw samples required before stability is judged
pub const STABILITY_WINDOW: usize = 10;

/// Outcome of feeding one sample into the stability stage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StabilityReading {
    /// Coefficient of variation in percent, 0 until the window is full
    pub cv: f64,
    pub is_unstable: bool,
    pub ready: bool,
}

impl StabilityReading {
    /// Stability on the user-facing 0-100 scale
    pub fn stability_pct(&self) -> f64 {
        (100.0 - self.cv).clamp(0.0, 100.0)
    }
}

/// Tracks recent raw currents and flags excessive variation
#[derive(Debug, Clone)]
pub struct StabilityStage {
    window: SlidingWindow,
}

impl Default for StabilityStage {
    fn default() -> Self {
        Self::new()
    }
}

impl StabilityStage {
    pub fn new() -> Self {
        Self {
            window: SlidingWindow::new(STABILITY_WINDOW),
        }
    }

    /// Record a raw current and classify the window.
    ///
    /// `stability_threshold_pct` is the minimum acceptable stability; the
    /// window is unstable when its CV exceeds `100 - stability_threshold_pct`.
    pub fn observe(
        &mut self,
        raw_current_ma: f64,
        stability_threshold_pct: f64,
    ) -> StabilityReading {
        self.window.push(raw_current_ma);

        if !self.window.is_full() {
            return StabilityReading::default();
        }

        let values = self.window.values();
        if stats::mean(&values) == 0.0 {
            return StabilityReading {
                cv: 0.0,
                is_unstable: false,
                ready: true,
            };
        }

        let cv = stats::coefficient_of_variation(&values);
        StabilityReading {
            cv,
            is_unstable: cv > 100.0 - stability_threshold_pct,
            ready: true,
        }
    }
}

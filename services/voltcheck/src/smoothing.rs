//! Moving-average smoothing of the displayed current

use crate::stats;
use crate::window::SlidingWindow;

/// Number of raw samples averaged for the display value
pub const SMOOTHING_WINDOW: usize = 5;

/// Turns noisy raw current readings into a steadier display value
#[derive(Debug, Clone)]
pub struct SmoothingStage {
    window: SlidingWindow,
}

impl Default for SmoothingStage {
    fn default() -> Self {
        Self::new()
    }
}

impl SmoothingStage {
    pub fn new() -> Self {
        Self {
            window: SlidingWindow::new(SMOOTHING_WINDOW),
        }
    }

    /// Record a raw current and return the smoothed value.
    ///
    /// Averages whatever has been seen so far while the window fills.
    pub fn observe(&mut self, raw_current_ma: f64) -> f64 {
        self.window.push(raw_current_ma);
        stats::mean(&self.window.values())
    }
}

//! Shared state for display values, alerts and the sample log

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::alert::{AlertEvent, FullChargeLatch};
use crate::display::DisplayReading;
use crate::notifier::NotificationRecord;
use crate::stability::StabilityReading;

/// An alert as it was raised, before delivery
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub event: AlertEvent,
    pub timestamp_epoch_ms: u64,
}

/// A raw sample kept for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSample {
    pub timestamp: DateTime<Utc>,
    pub current_ma: f64,
    pub voltage_v: f64,
    pub temperature_c: f64,
    pub level: u8,
    pub status: String,
}

/// Shared state written by the sampling task and read by the status API
#[derive(Debug)]
pub struct SharedState {
    pub display: Option<DisplayReading>,
    pub stability: StabilityReading,
    pub latch: FullChargeLatch,
    pub samples_seen: u64,
    pub alerts: VecDeque<AlertRecord>,
    pub history: VecDeque<NotificationRecord>,
    pub history_max_size: usize,
    pub sample_log: VecDeque<LoggedSample>,
    pub sample_log_max_size: usize,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(history_max_size: usize, sample_log_max_size: usize) -> Self {
        Self {
            display: None,
            stability: StabilityReading::default(),
            latch: FullChargeLatch::Armed,
            samples_seen: 0,
            alerts: VecDeque::with_capacity(history_max_size),
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
            sample_log: VecDeque::new(),
            sample_log_max_size,
            started_at: Instant::now(),
        }
    }

    /// Publish the latest tick
    pub fn update_display(
        &mut self,
        display: DisplayReading,
        stability: StabilityReading,
        latch: FullChargeLatch,
    ) {
        self.display = Some(display);
        self.stability = stability;
        self.latch = latch;
        self.samples_seen += 1;
    }

    /// Add a raised alert to the bounded alert log
    pub fn add_alert(&mut self, record: AlertRecord) {
        push_bounded(&mut self.alerts, record, self.history_max_size);
    }

    /// Add a notification to history
    pub fn add_notification(&mut self, record: NotificationRecord) {
        push_bounded(&mut self.history, record, self.history_max_size);
    }

    pub fn log_sample(&mut self, entry: LoggedSample) {
        push_bounded(&mut self.sample_log, entry, self.sample_log_max_size);
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, max_size: usize) {
    if max_size == 0 {
        return;
    }
    if queue.len() >= max_size {
        queue.pop_front();
    }
    queue.push_back(item);
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(history_max_size: usize, sample_log_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(
        history_max_size,
        sample_log_max_size,
    )))
}

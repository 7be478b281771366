//! Engine: drives a monitoring session from a sample source
//!
//! One task owns every stage for the lifetime of the session. Alerts leave
//! the task as owned values and are delivered on separate tasks so a slow
//! notifier never delays the next sample.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::alert::{AlertEvent, ThresholdAlertEngine};
use crate::config::{SamplingConfig, ThresholdConfig};
use crate::display::{DisplayReading, DisplayTracker};
use crate::notifier::{Notification, NotificationRecord, Notifier};
use crate::sample::{Sample, SampleSource};
use crate::state::{AlertRecord, LoggedSample, StateHandle};

/// Everything one tick produced
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub display: DisplayReading,
    pub events: Vec<AlertEvent>,
    /// `Some(connected)` when the charging flag flipped
    pub charger_change: Option<bool>,
    pub log_entry: Option<LoggedSample>,
}

/// Per-session sampling state: smoothing, alerting and charge tracking
#[derive(Debug)]
pub struct SamplingSession {
    display: DisplayTracker,
    alerts: ThresholdAlertEngine,
    was_charging: Option<bool>,
    ticks: u64,
    log_every: u64,
}

impl SamplingSession {
    pub fn new(sampling: &SamplingConfig, design_capacity_mah: Option<u32>) -> Self {
        Self {
            display: DisplayTracker::new(design_capacity_mah),
            alerts: ThresholdAlertEngine::new(),
            was_charging: None,
            ticks: 0,
            log_every: u64::from(sampling.log_every.max(1)),
        }
    }

    /// Process one sample against a snapshot of the thresholds
    pub fn process(
        &mut self,
        sample: &Sample,
        thresholds: &ThresholdConfig,
        now: Instant,
        now_epoch_ms: u64,
    ) -> TickOutput {
        let display = self.display.observe(sample, now_epoch_ms);
        let events = self.alerts.evaluate(sample, thresholds, now);

        let charger_change = match self.was_charging {
            Some(previous) if previous != sample.charging => Some(sample.charging),
            _ => None,
        };
        self.was_charging = Some(sample.charging);

        let log_entry = (self.ticks % self.log_every == 0).then(|| LoggedSample {
            timestamp: Utc::now(),
            current_ma: sample.current_ma,
            voltage_v: sample.voltage_v,
            temperature_c: sample.temperature_c,
            level: sample.level,
            status: if sample.charging {
                "Charging".to_string()
            } else {
                "Not Charging".to_string()
            },
        });
        self.ticks += 1;

        TickOutput {
            display,
            events,
            charger_change,
            log_entry,
        }
    }

    pub fn alerts(&self) -> &ThresholdAlertEngine {
        &self.alerts
    }
}

/// The engine polls the sample source and dispatches alerts
pub struct Engine {
    source: Arc<dyn SampleSource>,
    notifiers: Vec<Arc<dyn Notifier>>,
    thresholds: watch::Receiver<ThresholdConfig>,
    sampling: SamplingConfig,
    design_capacity_mah: Option<u32>,
    state: StateHandle,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        source: Arc<dyn SampleSource>,
        notifiers: Vec<Arc<dyn Notifier>>,
        thresholds: watch::Receiver<ThresholdConfig>,
        sampling: SamplingConfig,
        design_capacity_mah: Option<u32>,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            notifiers,
            thresholds,
            sampling,
            design_capacity_mah,
            state,
            cancel,
        }
    }

    /// Sample until the cancellation token is triggered
    pub async fn run(&self) {
        let mut session = SamplingSession::new(&self.sampling, self.design_capacity_mah);
        let mut interval = tokio::time::interval(Duration::from_millis(self.sampling.interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            "Sampling '{}' every {} ms",
            self.source.name(),
            self.sampling.interval_ms
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let sample = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sample = self.source.read_sample() => sample,
            };

            let thresholds = self.thresholds.borrow().clone();
            let now_ms = current_epoch_ms();
            let output = session.process(&sample, &thresholds, Instant::now(), now_ms);

            tracing::debug!(
                "Tick: {:.0} mA (raw {:.0}), {:.3} V, {:.1}°C, {}%, charging={}",
                output.display.current_ma,
                sample.current_ma,
                sample.voltage_v,
                sample.temperature_c,
                sample.level,
                sample.charging
            );

            {
                let mut state = self.state.write().await;
                state.update_display(
                    output.display,
                    session.alerts().last_stability(),
                    session.alerts().latch(),
                );
                if let Some(entry) = output.log_entry {
                    state.log_sample(entry);
                }
                for event in &output.events {
                    state.add_alert(AlertRecord {
                        event: event.clone(),
                        timestamp_epoch_ms: now_ms,
                    });
                }
            }

            for event in output.events {
                tracing::info!("{}: {}", event.kind(), event.message());
                self.spawn_dispatch(event.kind().to_string(), Notification::from_alert(&event));
            }

            if let Some(connected) = output.charger_change {
                if connected {
                    tracing::info!("Charger connected");
                } else {
                    tracing::info!("Charger disconnected");
                }
                if self.sampling.notify_charger_changes {
                    self.spawn_dispatch(
                        "charger".to_string(),
                        Notification::charger_changed(connected),
                    );
                }
            }
        }

        tracing::debug!("Sampling loop for '{}' stopped", self.source.name());
    }

    fn spawn_dispatch(&self, source: String, notification: Notification) {
        if self.notifiers.is_empty() {
            return;
        }
        let notifiers = self.notifiers.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            dispatch_notification(&source, &notification, &notifiers, &state).await;
        });
    }

    /// Start sampling on a background task
    pub fn spawn(self) -> MonitorHandle {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move { self.run().await });
        MonitorHandle { cancel, task }
    }
}

/// A running monitoring session
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop sampling; no further sample touches the state once this returns
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Sampling task ended abnormally: {}", e);
        }
    }
}

/// Send a notification through every notifier and record the outcome
pub async fn dispatch_notification(
    source: &str,
    notification: &Notification,
    notifiers: &[Arc<dyn Notifier>],
    state: &StateHandle,
) {
    for notifier in notifiers {
        tracing::debug!(
            "Dispatching to '{}' for '{}': {}",
            notifier.type_name(),
            source,
            notification.message
        );

        let result = notifier.notify(notification).await;
        if let Err(e) = &result {
            tracing::warn!(
                "Notification via '{}' for '{}' failed: {}",
                notifier.type_name(),
                source,
                e
            );
        }

        let record = NotificationRecord {
            source: source.to_string(),
            notifier_type: notifier.type_name().to_string(),
            message: notification.message.clone(),
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
            timestamp_epoch_ms: current_epoch_ms(),
        };
        state.write().await.add_notification(record);
    }
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

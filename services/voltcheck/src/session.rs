//! Time-boxed charger test runs
//!
//! A test collects one reading per tick for a fixed duration, then reduces
//! the buffered series to aggregates and a [`Verdict`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::TestConfig;
use crate::sample::{Sample, SampleSource};
use crate::stats;
use crate::verdict::Verdict;

/// Raw channels recorded during a test, index-aligned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    pub current_ma: Vec<f64>,
    pub voltage_v: Vec<f64>,
    pub temperature_c: Vec<f64>,
}

impl SampleSeries {
    pub fn len(&self) -> usize {
        self.current_ma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current_ma.is_empty()
    }

    pub fn push(&mut self, sample: &Sample) {
        self.current_ma.push(sample.current_ma);
        self.voltage_v.push(sample.voltage_v);
        self.temperature_c.push(sample.temperature_c);
    }

    pub fn clear(&mut self) {
        self.current_ma.clear();
        self.voltage_v.clear();
        self.temperature_c.clear();
    }
}

/// Summary of a completed test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Assigned by the store on save
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub avg_current_ma: f64,
    pub max_current_ma: f64,
    pub stability_pct: f64,
    pub voltage_drop_v: f64,
    pub verdict: String,
    pub samples: SampleSeries,
}

impl SessionResult {
    /// Reduce a recorded series to its aggregates and verdict
    pub fn from_series(name: String, created_at: DateTime<Utc>, samples: SampleSeries) -> Self {
        let avg_current_ma = stats::mean(&samples.current_ma);
        let max_current_ma = stats::max(&samples.current_ma);
        let stability_pct = stats::stability_pct(&samples.current_ma);
        let voltage_drop_v = stats::voltage_drop(&samples.voltage_v);
        let verdict = Verdict::classify(avg_current_ma, stability_pct, voltage_drop_v);

        Self {
            id: 0,
            name,
            created_at,
            avg_current_ma,
            max_current_ma,
            stability_pct,
            voltage_drop_v,
            verdict: verdict.to_string(),
            samples,
        }
    }

    pub fn classify(&self) -> Verdict {
        Verdict::classify(self.avg_current_ma, self.stability_pct, self.voltage_drop_v)
    }
}

/// Name given to a session when the user does not pick one
pub fn default_session_name(created_at: DateTime<Utc>) -> String {
    format!("Test {}", created_at.format("%Y-%m-%d %H:%M:%S"))
}

/// How a test run ended
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Completed(SessionResult),
    /// Too few samples to judge; nothing is saved
    InsufficientData { collected: usize, required: usize },
}

/// Buffers samples for one test run
#[derive(Debug, Clone)]
pub struct SessionAnalyzer {
    series: SampleSeries,
    duration_ticks: u64,
    elapsed_ticks: u64,
    min_manual_samples: usize,
    running: bool,
}

impl SessionAnalyzer {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            series: SampleSeries::default(),
            duration_ticks: config.duration_seconds,
            elapsed_ticks: 0,
            min_manual_samples: config.min_manual_samples,
            running: false,
        }
    }

    /// Discard any previous samples and begin a new run
    pub fn start(&mut self) {
        self.series.clear();
        self.elapsed_ticks = 0;
        self.running = true;
        tracing::debug!("Test started for {} ticks", self.duration_ticks);
    }

    /// Record one tick's reading and return the seconds remaining
    pub fn record(&mut self, sample: &Sample) -> u64 {
        if !self.running || self.is_expired() {
            return self.remaining_seconds();
        }
        self.series.push(sample);
        self.elapsed_ticks += 1;
        self.remaining_seconds()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.duration_ticks.saturating_sub(self.elapsed_ticks)
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed_ticks >= self.duration_ticks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn sample_count(&self) -> usize {
        self.series.len()
    }

    /// Finish after the timer ran out
    pub fn complete(&mut self, name: String, created_at: DateTime<Utc>) -> TestOutcome {
        self.finish(name, created_at, 1)
    }

    /// Finish early at the user's request
    pub fn stop(&mut self, name: String, created_at: DateTime<Utc>) -> TestOutcome {
        self.finish(name, created_at, self.min_manual_samples)
    }

    fn finish(&mut self, name: String, created_at: DateTime<Utc>, required: usize) -> TestOutcome {
        self.running = false;
        let collected = self.series.len();
        if collected < required {
            tracing::info!(
                "Test ended with {} samples, {} required for analysis",
                collected,
                required
            );
            return TestOutcome::InsufficientData {
                collected,
                required,
            };
        }

        let result = SessionResult::from_series(name, created_at, self.series.clone());
        tracing::info!(
            "Test '{}' complete: avg={:.0} mA, max={:.0} mA, stability={:.1}%, drop={:.3} V",
            result.name,
            result.avg_current_ma,
            result.max_current_ma,
            result.stability_pct,
            result.voltage_drop_v
        );
        TestOutcome::Completed(result)
    }
}

/// Drive a test run against `source`, one reading per `tick`.
///
/// Cancelling the token ends the run as a manual stop.
pub async fn run_test(
    source: &dyn SampleSource,
    config: &TestConfig,
    tick: Duration,
    name: Option<String>,
    cancel: CancellationToken,
) -> TestOutcome {
    let mut analyzer = SessionAnalyzer::new(config);
    analyzer.start();

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let stopped_early = loop {
        tokio::select! {
            _ = interval.tick() => {
                let sample = source.read_sample().await;
                let remaining = analyzer.record(&sample);
                tracing::debug!(
                    "Test sample {:.0} mA, {:.2} V, {:.1}°C ({}s remaining)",
                    sample.current_ma,
                    sample.voltage_v,
                    sample.temperature_c,
                    remaining
                );
                if analyzer.is_expired() {
                    break false;
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("Test cancelled after {} samples", analyzer.sample_count());
                break true;
            }
        }
    };

    let created_at = Utc::now();
    let name = name.unwrap_or_else(|| default_session_name(created_at));
    if stopped_early {
        analyzer.stop(name, created_at)
    } else {
        analyzer.complete(name, created_at)
    }
}

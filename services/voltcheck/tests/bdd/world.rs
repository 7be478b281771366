//! BDD test world for voltcheck

use std::time::{Duration, Instant};

use cucumber::World;
use tempfile::TempDir;
use voltcheck::alert::{AlertEvent, ThresholdAlertEngine};
use voltcheck::config::ThresholdConfig;
use voltcheck::session::{SessionAnalyzer, TestOutcome};
use voltcheck::store::JsonFileStore;

#[derive(Debug, Default, World)]
pub struct VoltcheckWorld {
    // Alert engine testing
    pub thresholds: ThresholdConfig,
    pub alert_engine: ThresholdAlertEngine,
    pub clock_origin: Option<Instant>,
    pub last_events: Vec<AlertEvent>,
    pub all_events: Vec<AlertEvent>,

    // Charger test runs
    pub analyzer: Option<SessionAnalyzer>,
    pub outcome: Option<TestOutcome>,

    // Result store and export
    pub store_dir: Option<TempDir>,
    pub store: Option<JsonFileStore>,
    pub export_csv: Option<String>,
    pub last_error: Option<voltcheck::VoltcheckError>,
}

impl VoltcheckWorld {
    /// Monotonic instant `ms` milliseconds after the scenario's first sample
    pub fn at(&mut self, ms: u64) -> Instant {
        let origin = *self.clock_origin.get_or_insert_with(Instant::now);
        origin + Duration::from_millis(ms)
    }

    pub fn store(&mut self) -> &JsonFileStore {
        if self.store.is_none() {
            let dir = TempDir::new().expect("failed to create temp dir");
            self.store = Some(JsonFileStore::new(dir.path().join("sessions.json")));
            self.store_dir = Some(dir);
        }
        self.store.as_ref().expect("store not created")
    }
}

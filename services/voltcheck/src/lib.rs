//! Voltcheck - charging telemetry sampler
//!
//! Samples charging current, voltage and temperature, publishes smoothed
//! display values, raises threshold alerts and runs timed charger tests.

pub mod alert;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod engine;
pub mod error;
pub mod export;
pub mod http_source;
pub mod io;
pub mod log_notifier;
pub mod notifier;
pub mod pushover;
pub mod sample;
pub mod session;
pub mod smoothing;
pub mod stability;
pub mod state;
pub mod stats;
pub mod store;
pub mod verdict;
pub mod window;

pub use config::{load_config, Config};
pub use error::{Result, VoltcheckError};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{NotifierConfig, SourceConfig};
use crate::dashboard::DashboardState;
use crate::engine::Engine;
use crate::http_source::HttpSampleSource;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::log_notifier::LogNotifier;
use crate::notifier::Notifier;
use crate::pushover::PushoverNotifier;
use crate::sample::SampleSource;
use crate::session::TestOutcome;
use crate::store::{JsonFileStore, ResultStore};

const NOTIFIER_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the telemetry source; a read never outlives one tick
fn source_client(config: &Config) -> Result<Arc<dyn HttpClient>> {
    let interval = Duration::from_millis(config.sampling.interval_ms);
    let timeout = interval.max(Duration::from_millis(250));
    Ok(Arc::new(ReqwestHttpClient::with_timeout(timeout)?))
}

/// Build the configured sample source
pub fn build_source(config: &SourceConfig, http: Arc<dyn HttpClient>) -> Arc<dyn SampleSource> {
    match config {
        SourceConfig::Http { .. } => Arc::new(HttpSampleSource::new(config, http)),
    }
}

/// Build every configured notifier
pub fn build_notifiers(
    configs: &[NotifierConfig],
    http: Arc<dyn HttpClient>,
) -> Result<Vec<Arc<dyn Notifier>>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    for notifier_config in configs {
        let notifier: Arc<dyn Notifier> = match notifier_config {
            NotifierConfig::Pushover { .. } => Arc::new(PushoverNotifier::new(
                notifier_config,
                Arc::clone(&http),
            )?),
            NotifierConfig::Log => Arc::new(LogNotifier),
        };
        notifiers.push(notifier);
    }
    Ok(notifiers)
}

/// Cancel `cancel` on ctrl-c
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
    });
}

/// Run continuous monitoring until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let source = build_source(&config.source, source_client(&config)?);
    let notifiers = build_notifiers(
        &config.notifiers,
        Arc::new(ReqwestHttpClient::with_timeout(NOTIFIER_TIMEOUT)?),
    )?;
    let store: Arc<dyn ResultStore> = Arc::new(JsonFileStore::new(config.store.path.clone()));
    let state = state::new_state_handle(
        config.dashboard.history_size,
        config.sampling.log_capacity,
    );
    let (thresholds_tx, thresholds_rx) = watch::channel(config.thresholds.clone());
    let thresholds_tx = Arc::new(thresholds_tx);

    cancel_on_ctrl_c(cancel.clone());

    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_state = DashboardState {
            state: Arc::clone(&state),
            thresholds: Arc::clone(&thresholds_tx),
            store,
        };
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    let engine = Engine::new(
        source,
        notifiers,
        thresholds_rx,
        config.sampling.clone(),
        config.design_capacity_mah,
        Arc::clone(&state),
        cancel.clone(),
    );

    tracing::info!("Monitoring started");
    let handle = engine.spawn();
    cancel.cancelled().await;
    handle.stop().await;
    tracing::info!("Monitoring stopped");

    Ok(())
}

/// Run one charger test and store the result when it completes.
///
/// Ctrl-c ends the test early; it is analyzed only if enough samples were
/// collected.
pub async fn run_test_session(
    config: &Config,
    name: Option<String>,
    store: &dyn ResultStore,
) -> Result<TestOutcome> {
    let source = build_source(&config.source, source_client(config)?);
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    tracing::info!(
        "Starting {}s charger test on '{}'",
        config.test.duration_seconds,
        source.name()
    );
    let tick = Duration::from_secs(1);
    let outcome = session::run_test(source.as_ref(), &config.test, tick, name, cancel).await;
    save_outcome(outcome, store).await
}

/// Persist a completed outcome, returning it with its stored id
pub async fn save_outcome(outcome: TestOutcome, store: &dyn ResultStore) -> Result<TestOutcome> {
    match outcome {
        TestOutcome::Completed(mut result) => {
            result.id = store.save(result.clone()).await?;
            tracing::info!("Saved session {} '{}'", result.id, result.name);
            Ok(TestOutcome::Completed(result))
        }
        insufficient => Ok(insufficient),
    }
}

//! Voltcheck CLI
//!
//! Continuous charge monitoring, timed charger tests and stored test history.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use voltcheck::session::TestOutcome;
use voltcheck::store::{JsonFileStore, ResultStore};
use voltcheck::{export, load_config, Config};

#[derive(Parser)]
#[command(name = "voltcheck")]
#[command(about = "Charging telemetry sampler and charger tester")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor charging continuously and raise alerts
    Monitor {
        /// Dashboard port (overrides config file)
        #[arg(long)]
        dashboard_port: Option<u16>,
    },
    /// Run a timed charger test and store the result
    Test {
        /// Session name (defaults to the start time)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Inspect and manage stored test results
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored sessions, most recent first
    List,
    /// Rename a stored session
    Rename { id: u64, name: String },
    /// Delete a stored session
    Delete { id: u64 },
    /// Delete every stored session
    Clear,
    /// Export stored sessions as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, log_level={:?}",
        args.config,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    match args.command {
        Command::Monitor { dashboard_port } => {
            if let Some(dashboard_port) = dashboard_port {
                config.dashboard.port = dashboard_port;
            }
            tracing::info!("Starting voltcheck monitor");
            tracing::debug!(
                "Sampling every {} ms, notifiers: {}",
                config.sampling.interval_ms,
                config.notifiers.len()
            );
            voltcheck::run(config).await?;
        }
        Command::Test { name } => {
            let store = JsonFileStore::new(config.store.path.clone());
            match voltcheck::run_test_session(&config, name, &store).await? {
                TestOutcome::Completed(result) => {
                    println!("{} (session {})", result.name, result.id);
                    println!("{}", result.classify());
                }
                TestOutcome::InsufficientData {
                    collected,
                    required,
                } => {
                    println!(
                        "Not enough data: {} samples collected, {} needed",
                        collected, required
                    );
                }
            }
        }
        Command::History { action } => {
            let store = JsonFileStore::new(config.store.path.clone());
            run_history(action, &store).await?;
        }
    }

    Ok(())
}

async fn run_history(
    action: HistoryAction,
    store: &JsonFileStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HistoryAction::List => {
            for session in store.list().await? {
                println!(
                    "{:>4}  {}  {:<28} {:>5.0} mA  {:>5.1}%  {:.3} V",
                    session.id,
                    session.created_at.format("%Y-%m-%d %H:%M:%S"),
                    session.name,
                    session.avg_current_ma,
                    session.stability_pct,
                    session.voltage_drop_v
                );
            }
        }
        HistoryAction::Rename { id, name } => store.rename(id, &name).await?,
        HistoryAction::Delete { id } => store.delete(id).await?,
        HistoryAction::Clear => store.delete_all().await?,
        HistoryAction::Export { output } => {
            let csv = export::sessions_to_csv(&store.list().await?)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, csv).await?;
                    tracing::info!("Exported sessions to {:?}", path);
                }
                None => print!("{}", csv),
            }
        }
    }
    Ok(())
}

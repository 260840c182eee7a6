//! pool-cycle
//!
//! Restarts every member of a load balancer pool, one at a time, without
//! taking the pool below safe capacity.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!   pool_cycle.toml  │                  pool-cycle                  │
//!   ─────────────────┼─▶ config ──▶ CycleController                 │
//!                    │                 │   │    │                   │
//!                    │      ┌──────────┘   │    └───────────┐       │
//!                    │      ▼              ▼                ▼       │
//!                    │ control_plane    service          notify     │
//!                    │ (iControl REST)  (restart REST)   (SMTP)     │
//!                    └──────┬──────────────┬────────────────┬───────┘
//!                           ▼              ▼                ▼
//!                     Load balancer   Member hosts     Mail relay
//! ```
//!
//! # Exit Codes
//! - 0: run completed, or stopped early after raising an alert
//! - 1: configuration could not be loaded

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use pool_cycle::config::{load_config, CycleConfig, ObservabilityConfig};
use pool_cycle::control_plane::{ControlPlane, F5RestClient};
use pool_cycle::cycle::{CycleController, CycleSettings, RunOutcome, TokioPause};
use pool_cycle::health::{verify_members, verify_pool};
use pool_cycle::notify::SmtpNotifier;
use pool_cycle::observability::{logging::init_logging, metrics};
use pool_cycle::service::SplunkRestClient;

const DEFAULT_CONFIG: &str = "pool_cycle.toml";

#[derive(Parser)]
#[command(name = "pool-cycle", version)]
#[command(about = "Rolling, connection-aware restart of a load balancer pool", long_about = None)]
struct Cli {
    /// Configuration file (default: pool_cycle.toml next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cycle this pool instead of the configured one
    #[arg(short, long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pool: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Drain, restart and re-enable every pool member (default)
    Run,
    /// Print pool and member status without changing anything
    Status,
    /// Load and validate the configuration, then exit
    Validate,
}

fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let path = cli.config.clone().unwrap_or_else(default_config_path);

    let mut config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ObservabilityConfig::default());
            tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
            return ExitCode::from(1);
        }
    };
    if let Some(pool) = cli.pool {
        config.control_plane.pool = pool;
    }

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(1);
    }
    tracing::info!(path = %path.display(), pool = %config.control_plane.pool, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Validate => {
            println!(
                "configuration ok: pool {} in partition {}, {} restart attempts, {} alert recipients",
                config.control_plane.pool,
                config.control_plane.partition,
                config.restart.retries,
                config.alerts.recipients.len()
            );
            ExitCode::SUCCESS
        }
        Commands::Status => status(&config).await,
        Commands::Run => run(&config).await,
    }
}

async fn status(config: &CycleConfig) -> ExitCode {
    let control = match F5RestClient::new(&config.control_plane) {
        Ok(control) => control,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build control plane client");
            return ExitCode::from(1);
        }
    };
    let pool = config.control_plane.pool.as_str();

    let report = async {
        let partition = control.set_active_partition(&config.control_plane.partition).await?;
        let verdict = verify_pool(&control, pool).await?;
        let members = verify_members(&control, pool).await?;
        Ok::<_, pool_cycle::control_plane::ControlPlaneError>(serde_json::json!({
            "pool": pool,
            "partition": partition,
            "healthy": verdict.healthy,
            "status": verdict.status,
            "members": members.members,
            "down_members": members.down_members,
        }))
    }
    .await;

    match report {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::error!(error = %e, "Failed to render status"),
        },
        Err(e) => tracing::error!(error = %e, "Failed to read pool status"),
    }
    ExitCode::SUCCESS
}

async fn run(config: &CycleConfig) -> ExitCode {
    let metrics_handle = match &config.observability.metrics_textfile {
        Some(_) => match metrics::install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Metrics recorder unavailable");
                None
            }
        },
        None => None,
    };

    let control = match F5RestClient::new(&config.control_plane) {
        Ok(control) => control,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build control plane client");
            return ExitCode::from(1);
        }
    };
    let service = match SplunkRestClient::new(&config.service) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build service client");
            return ExitCode::from(1);
        }
    };
    if let Some(target) = &config.service.target_override {
        tracing::warn!(%target, "Restart target overridden; every restart goes to this host");
    }

    let controller = CycleController::new(
        control,
        service,
        SmtpNotifier::new(&config.alerts),
        TokioPause,
        CycleSettings::from_config(config),
    );

    let outcome = controller.run().await;
    match &outcome {
        RunOutcome::Completed { cycled } => {
            tracing::info!(cycled, "Run completed");
        }
        other => {
            tracing::warn!(outcome = ?other, cycled = other.cycled(), "Run stopped early");
        }
    }

    if let (Some(handle), Some(path)) = (&metrics_handle, &config.observability.metrics_textfile) {
        if let Err(e) = metrics::write_textfile(handle, std::path::Path::new(path)) {
            tracing::warn!(path = %path, error = %e, "Failed to write metrics textfile");
        }
    }

    ExitCode::SUCCESS
}

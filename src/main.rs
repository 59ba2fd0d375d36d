//! Status checker server.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   tick    ┌─────────────┐
//!   │  scheduler   │──────────▶│             │   probes    ┌──────────────┐
//!   └──────────────┘           │   monitor   │────────────▶│   platform   │
//!   ┌──────────────┐  /test    │  (runners)  │             │ (base/drive) │
//!   │ http server  │──────────▶│             │             └──────────────┘
//!   │              │           └──────┬──────┘                    ▲
//!   │  /results    │                  │ report                    │
//!   │  /summaries  │◀──────────┐      ▼                           │
//!   └──────────────┘      ┌────┴─────────────┐   runs + summaries │
//!                         │     recorder     │────────────────────┘
//!                         └──────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use status_checker::config::{load_config_with, Overrides};
use status_checker::observability::{logging, metrics};
use status_checker::{App, Scheduler, Shutdown, StatusServer};

const CLEANUP_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "status-checker")]
#[command(about = "Synthetic monitoring server", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "status-checker.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = Overrides {
        project_key: std::env::var("STATUS_PROJECT_KEY").ok(),
        region: std::env::var("STATUS_REGION").ok(),
        api_key: None,
    };
    let config = load_config_with(&args.config, overrides)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "status-checker starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        region = %config.runner.region,
        mode = ?config.platform.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let app = App::build(config)?;
    let shutdown = Shutdown::new();

    // Bound before the first sweep: the micro suite pings this listener.
    let listener = TcpListener::bind(&app.config.listener.bind_address).await?;
    let server = StatusServer::new(&app);

    let scheduler = Scheduler::new(app.monitor.clone(), app.config.scheduler.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(shutdown.clone().trigger_on_ctrl_c());

    server.run(listener, server_shutdown).await?;
    shutdown.trigger();
    let _ = scheduler_task.await;

    let drain = app.monitor.wait_for_cleanup();
    if tokio::time::timeout(CLEANUP_GRACE, drain).await.is_err() {
        tracing::error!(
            grace_secs = CLEANUP_GRACE.as_secs(),
            "Abandoned runs did not finish cleanup before exit"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

//! sledge server
//!
//! Multi-database JSON document store with read-time channel transforms.

use anyhow::Context;
use clap::{Arg, Command};
use sledge::api::start_server;
use sledge::core::config::StorageType;
use sledge::core::logging::init_tracing;
use sledge::core::{AppState, Config};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("sledge")
        .version(sledge::VERSION)
        .about("Multi-database JSON document store with channel transforms.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("storage-type")
                .long("storage-type")
                .value_name("TYPE")
                .help("Storage backend type (memory)"),
        )
        .arg(
            Arg::new("time-prefix")
                .long("time-prefix")
                .value_name("PREFIX")
                .help("Default prefix for _auto_time ids"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .help("Worker threads for bulk transforms (0 = CPU count)"),
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(path).with_context(|| format!("loading {}", path))?,
        None => Config::load().context("loading configuration")?,
    };

    apply_cli_overrides(&mut config, &matches)?;
    init_tracing(&config.logging);

    info!("Starting sledge v{}", sledge::VERSION);

    let state = AppState::from_config(config).context("initializing services")?;
    start_server(state, shutdown_signal()).await.context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> anyhow::Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr.parse().with_context(|| format!("invalid HTTP address: {}", addr))?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if let Some(storage_type) = matches.get_one::<String>("storage-type") {
        config.storage.storage_type = storage_type.parse::<StorageType>()?;
    }

    if let Some(prefix) = matches.get_one::<String>("time-prefix") {
        config.ids.time_prefix = prefix.clone();
    }

    if let Some(workers) = matches.get_one::<String>("workers") {
        config.channel.max_workers = workers
            .parse()
            .with_context(|| format!("invalid worker count: {}", workers))?;
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
    warn!("Initiating graceful shutdown...");
}

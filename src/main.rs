//! Main entry point for the session broker
//!
//! Initializes configuration and logging, then serves the match endpoint
//! until SIGINT/SIGTERM with a bounded graceful shutdown.

use anyhow::Result;
use clap::Parser;
use session_broker::config::{AppConfig, BackendKind};
use session_broker::service::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Session Broker - find-or-create matchmaking for hosted game sessions
#[derive(Parser)]
#[command(
    name = "session-broker",
    version,
    about = "Find-or-create matchmaking in front of a managed game session hosting backend",
    long_about = "Session Broker answers \"find match\" requests: it resolves the configured \
                 routing queue, admits the player into the oldest joinable game session, or \
                 requests a new session placement when none is joinable."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Backend implementation override
    #[arg(long, value_enum, help = "Session backend to use")]
    backend: Option<BackendKind>,

    /// Backend endpoint override
    #[arg(long, value_name = "URL", help = "Override session backend endpoint")]
    backend_endpoint: Option<String>,

    /// Target queue override
    #[arg(long, value_name = "NAME", help = "Override the routing queue name")]
    queue_name: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Session Broker");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Listen: {}:{}",
        config.service.http_host, config.service.http_port
    );
    info!(
        "   Backend: {:?} ({})",
        config.backend.kind,
        config.backend_endpoint()
    );
    info!("   Queue: {}", config.matchmaking.target_queue_name);
    info!("   Max players: {}", config.matchmaking.max_player_count);
    info!(
        "   Fallback to placement: {}",
        config.matchmaking.fallback_to_placement
    );
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(backend) = args.backend {
        config.backend.kind = backend;
    }

    if let Some(endpoint) = &args.backend_endpoint {
        config.backend.endpoint = Some(endpoint.clone());
    }

    if let Some(queue_name) = &args.queue_name {
        config.matchmaking.target_queue_name = queue_name.clone();
    }

    session_broker::config::validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    let app_state = match AppState::new(config.clone()).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(app_state.serve(async move {
        let _ = shutdown_rx.await;
    }));

    info!("Session broker is running, press Ctrl+C to shutdown");
    tokio::select! {
        result = &mut server => {
            match result {
                Ok(Ok(())) => info!("Server stopped"),
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task failed: {}", e),
            }
            std::process::exit(1);
        }
        _ = wait_for_shutdown_signal() => {
            info!("Shutdown signal received, draining in-flight requests...");
        }
    }

    let _ = shutdown_tx.send(());

    match tokio::time::timeout(config.shutdown_timeout(), server).await {
        Ok(Ok(Ok(()))) => info!("Graceful shutdown completed successfully"),
        Ok(Ok(Err(e))) => {
            error!("Server error: {}", e);
            std::process::exit(1);
        }
        Ok(Err(e)) => {
            error!("Server task failed: {}", e);
            std::process::exit(1);
        }
        Err(_) => warn!("Shutdown timeout exceeded, forcing exit"),
    }

    Ok(())
}

//! Connection Status Exporter binary entry point.

use std::sync::Arc;

use clap::Parser;
use connection_status_exporter::{
    ExporterConfig, SocketSetExporter,
    config::parse_listen_address,
    server::{AppState, METRICS_PATH, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prometheus exporter for socket connection status
#[derive(Parser, Debug)]
#[command(name = "connection-status-exporter", version, about, long_about = None)]
struct Cli {
    /// Exporter configuration file
    #[arg(
        long,
        default_value = "config/config.yaml",
        env = "CONNECTION_STATUS_CONFIG"
    )]
    config_file: String,

    /// The address to listen on for HTTP requests (overrides config file)
    #[arg(long, env = "CONNECTION_STATUS_LISTEN_ADDRESS")]
    listen_address: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,connection_status_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading configuration from: {}", cli.config_file);
    let mut config = ExporterConfig::load(&cli.config_file)
        .map_err(|e| format!("Error while reading configuration file: {e}"))?;

    // CLI > ENV > config file
    if let Some(address) = cli.listen_address {
        config.server.listen_address = address;
    }
    let addr = parse_listen_address(&config.server.listen_address)?;

    let sockets = config
        .into_socket_set()
        .map_err(|e| format!("Error in the configuration of the sockets: {e}"))?;
    if sockets.is_empty() {
        tracing::warn!("No sockets configured, metrics will be empty");
    }

    let exporter = SocketSetExporter::new(sockets)?;
    tracing::info!(
        sockets = exporter.sockets().len(),
        "Socket exporter initialized"
    );

    let app = create_router(AppState {
        collector: Arc::new(exporter),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Serving metrics on: http://{}{}", addr, METRICS_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

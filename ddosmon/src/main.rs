//! ddosmon - main entry point
//!
//! Wires the pipeline: directory watcher -> ingestion coordinator ->
//! broadcast hub -> realtime channel, plus the HTTP metrics endpoints on
//! their own port.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ddosmon::config::{Args, Config};
use ddosmon::hub::Hub;
use ddosmon::sysmon::MetricsGateway;
use ddosmon::watch::{DirWatcher, FilePattern};
use ddosmon::{build_router, ingest, realtime, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ddosmon=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(args)?;

    info!("Starting ddosmon v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Watching {} for {}*{} (column '{}')",
        config.watch_dir.display(),
        config.file_prefix,
        config.file_suffix,
        config.score_column
    );

    // The watch is the root of the pipeline; failing to establish it
    // aborts startup.
    let pattern = FilePattern::new(&config.file_prefix, &config.file_suffix);
    let (watcher, events) = DirWatcher::spawn(&config.watch_dir, pattern)
        .with_context(|| format!("Failed to watch {}", config.watch_dir.display()))?;

    let hub = Arc::new(Hub::new());

    // Ingestion coordinator
    tokio::spawn(ingest::run(
        events,
        Arc::clone(&hub),
        config.score_column.clone(),
    ));

    // Realtime score channel on its own port
    let realtime_addr = SocketAddr::from(([0, 0, 0, 0], config.realtime_port));
    let realtime_listener = tokio::net::TcpListener::bind(realtime_addr)
        .await
        .context("Failed to bind realtime port")?;
    info!("Realtime channel listening on ws://{}", realtime_addr);

    let realtime_app = realtime::build_router(Arc::clone(&hub));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(realtime_listener, realtime_app).await {
            error!("Realtime server error: {}", e);
        }
    });

    // Metrics HTTP endpoints
    let state = AppState {
        metrics: Arc::new(MetricsGateway::new()),
        default_interface: config.interface.clone(),
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind HTTP port")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Releases the OS watch handle and ends the ingestion stream.
    drop(watcher);
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

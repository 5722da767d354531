use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::info;

use govai::api::routes::{create_router, AppState};
use govai::config::Config;
use govai::engine::{DriftMonitor, GovernanceService};
use govai::observability::{init_tracing, MetricsRegistry};
use govai::storage::{PostgresStorage, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting govai governance service"
    );

    // Connect and migrate, bounded retries before giving up
    let storage = PostgresStorage::connect_with_retry(
        &config.database_url(),
        config.pool_settings(),
        config.db_connect_attempts,
        config.db_connect_retry_delay(),
    )
    .await
    .context("database unavailable at startup")?;

    let storage = Arc::new(storage);
    let repos = Repositories::from_backend(storage.clone());
    let metrics = Arc::new(MetricsRegistry::new());

    let defaults = config.policy_defaults();
    info!(
        default_confidence = defaults.default_confidence,
        require_citations = defaults.require_citations,
        "Policy defaults loaded"
    );

    // Create application state
    let state = Arc::new(AppState {
        governance: GovernanceService::new(&repos, defaults, metrics.clone()),
        drift: DriftMonitor::new(repos.audits.clone(), metrics.clone()),
        metrics,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_addr))?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        axum::serve(listener, app).await?;
    }

    // Cleanup
    info!("Shutting down...");
    storage.pool().close().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}

//! user-sync server - Receives auth provider user webhooks.
//!
//! This binary:
//! - Verifies svix-signed webhooks
//! - Creates user records on `user.created`
//! - Serves user lookups through the shared data client

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use usersync::web::router;
use usersync::{AppState, Config, InMemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        database_configured = config.database_url.is_some(),
        webhook_tolerance_secs = config.webhook_tolerance_secs,
        auth_publishable_key_set = config.auth_publishable_key.is_some(),
        "config_loaded"
    );

    // Pick the storage backend
    let postgres = match &config.database_url {
        Some(url) => {
            let store = PgUserStore::connect(url, config.database_max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            store.migrate().await.context("Failed to prepare schema")?;
            Some(store)
        }
        None => {
            warn!("database_url_not_set_using_memory_store");
            None
        }
    };

    let store: Arc<dyn UserStore> = match &postgres {
        Some(pg) => Arc::new(pg.clone()),
        None => Arc::new(InMemoryUserStore::new()),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Create application state
    let state = AppState::new(config, store).context("Invalid webhook secret")?;
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pg) = postgres {
        pg.close().await;
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}

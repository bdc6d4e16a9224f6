//! Gatekeeper HTTP server binary.
//!
//! Wires configuration, the `PostgreSQL` store, the Redis lock coordinator
//! and the booking service together, then serves the Axum router until a
//! shutdown signal arrives.

use gatekeeper_booking::BookingService;
use gatekeeper_core::{CapacityStore, LockCoordinator};
use gatekeeper_lock::RedisLockCoordinator;
use gatekeeper_postgres::PostgresStore;
use gatekeeper_server::Config;
use gatekeeper_server::server::{AppState, build_router};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; environment variables win either way.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gatekeeper HTTP server");

    // Load configuration
    let config = Config::from_env();
    info!(
        database_url = %config.postgres.url,
        redis_url = %config.redis.url,
        lock_ttl_ms = config.booking.lock_ttl_ms,
        "Configuration loaded"
    );

    // Setup the store
    info!("Connecting to database...");
    let store = Arc::new(
        PostgresStore::with_max_connections(&config.postgres.url, config.postgres.max_connections)
            .await?,
    );
    store.migrate().await?;
    info!("Database connected and migrated");

    // Setup the distributed booking lock
    info!("Connecting to lock backend...");
    let lock = Arc::new(
        RedisLockCoordinator::with_ttl(&config.redis.url, config.booking.lock_ttl()).await?,
    );
    info!("Lock backend connected");

    // Compose the booking service: both seams injected, no globals.
    let lock_dyn: Arc<dyn LockCoordinator> = lock;
    let store_dyn: Arc<dyn CapacityStore> = store.clone();
    let booking = Arc::new(BookingService::with_lock_key_prefix(
        lock_dyn,
        store_dyn,
        config.booking.lock_key_prefix.clone(),
    ));

    // Build router
    let state = AppState::new(store, booking);
    let app = build_router(state);

    // Create server address
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

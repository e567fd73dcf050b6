//! HTTP server initialization and runtime setup.
//!
//! Handles store connection, seeding, cache background tasks, and the Axum
//! server lifecycle.

use crate::application::services::{LookupService, SeedService, load_seed_entries};
use crate::config::{Config, StoreBackend};
use crate::domain::repositories::RemoteStore;
use crate::infrastructure::cache::ClientSideCache;
use crate::infrastructure::store::{InMemoryStore, RedisStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes, in order:
/// - Remote store (Redis with client tracking, or in-memory)
/// - Startup seeding (set-if-absent)
/// - Client-side cache with its invalidation listener and sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Redis connection or tracking setup fails
/// - Seeding fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store: Arc<dyn RemoteStore> = match config.store_backend {
        StoreBackend::Redis => {
            let redis = RedisStore::connect(&config.redis_url)
                .await
                .context("Failed to connect to Redis")?;
            Arc::new(redis)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; mappings are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let entries = load_seed_entries(config.seed_file.as_deref())?;
    let report = SeedService::new(store.clone(), config.cache_ttl())
        .seed(&entries)
        .await
        .context("Startup seeding failed")?;
    tracing::info!(
        "Seeding done: {} inserted, {} already present",
        report.inserted,
        report.existing
    );

    let cache = Arc::new(ClientSideCache::new(store, config.cache_policy()));
    let listener_task = cache.spawn_invalidation_listener();
    let sweeper_task = cache.spawn_sweeper(config.sweep_period());
    tracing::info!("Client-side cache started");

    let state = AppState::new(
        Arc::new(LookupService::new(cache)),
        config.lookup_timeout(),
        config.behind_proxy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    listener_task.abort();
    sweeper_task.abort();
    tracing::info!("Server stopped");

    served?;
    Ok(())
}

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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}

//! Tiered Cache server
//!
//! Serves a multi-level cache (in-process L1, optional Redis L2) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::api::{create_router, AppState};
use tiered_cache::cache::{Cache, MemoryCache, MultiLevelCache};
use tiered_cache::Config;

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the level chain (memory first, Redis behind it when configured)
/// 4. Serve HTTP until SIGINT/SIGTERM
/// 5. Close every level
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tiered Cache Server");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: default_ttl={}s, port={}, cleanup_interval={}s, redis={}",
        config.default_ttl,
        config.server_port,
        config.cleanup_interval,
        config.redis_url.is_some()
    );

    let cache = build_cache(&config).await?;
    info!(levels = cache.levels().len(), "Cache levels initialized");

    let state = AppState::new(cache, config.default_ttl());
    let cache = Arc::clone(&state.cache);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(err) = cache.close().await {
        warn!(error = %err, "Failed to close every cache level");
    }
    info!("Server shutdown complete");
    Ok(())
}

async fn build_cache(config: &Config) -> anyhow::Result<MultiLevelCache> {
    let memory: Arc<dyn Cache> = Arc::new(MemoryCache::with_cleanup_interval(
        config.cleanup_interval(),
    )?);
    let mut builder = MultiLevelCache::builder().level(memory);

    match config.redis_url.as_deref() {
        #[cfg(feature = "redis")]
        Some(url) => {
            let redis = tiered_cache::cache::RedisCache::connect(url)
                .await
                .context("failed to connect to Redis")?;
            info!("Connected to Redis level");
            builder = builder.level(Arc::new(redis));
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => warn!("REDIS_URL is set but the redis feature is disabled"),
        None => {}
    }

    Ok(builder.build()?)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
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
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

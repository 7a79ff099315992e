//! WOMS HTTP Server Binary
//!
//! This is the main entry point for the WOMS REST API server. It builds
//! the repository, broadcast hub, and rate-limit store, wires them into
//! the HTTP router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin woms-server
//! ```
//!
//! # Configuration
//!
//! Optional `woms.toml` in the working directory, overridden by
//! environment variables:
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RATE_LIMIT_SWEEP_SECS`: Interval of the rate-limit sweep (default: 60)
//! - `RUST_LOG`: Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use woms_rust::config::ServerConfig;
use woms_rust::db::{repository::FullRepository, LocalRepository};
use woms_rust::http::{create_router, rate_limit, AppState, RateLimitStore};
use woms_rust::realtime::Hub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting WOMS HTTP Server");

    let config = ServerConfig::from_default_location().with_env_overrides();

    // Every store is constructed here and handed down explicitly.
    let repository = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    let hub = Arc::new(Hub::new());
    let rate_limits = Arc::new(RateLimitStore::new());
    info!("Repository, hub, and rate-limit store initialized");

    // Bound the counter map; admission never removes entries on its own.
    let sweeper = rate_limit::spawn_sweeper(
        rate_limits.clone(),
        Duration::from_secs(config.rate_limit.sweep_interval_secs),
    );

    let state = AppState::new(repository, hub, rate_limits);
    let app = create_router(state);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Peer addresses feed the rate limiter's last-resort identity.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    sweeper.abort();
    Ok(())
}

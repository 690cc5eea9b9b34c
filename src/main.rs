use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gsmaster::{
    api::AppState,
    config::Config,
    create_router,
    store::{Store, SystemClock},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting gsmaster directory server");

    // Load configuration
    let config = Config::load()?;
    tracing::info!(servers_file = %config.servers_file, ttl = config.server_ttl_secs, "Configuration loaded");

    // Open the entry store
    let store = Store::open(
        &config.servers_file,
        config.server_ttl_secs,
        Arc::new(SystemClock),
    );

    // Build application state
    let state = AppState::new(store, config.clone());

    // Build router
    let app = create_router(state);

    // Start server. Handlers key entries by the peer address, so the
    // listener must expose connection info.
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

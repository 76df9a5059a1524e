// src/main.rs
use socketioxide::SocketIo;
use std::sync::Arc;
use tracing::{info, warn};
use web_settings::{config::Config, init_tracing, routes::create_router, setup_shared_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("🚀 Starting web settings server");

    let config = Arc::new(Config::from_env()?);
    let (layer, io) = SocketIo::builder()
        .max_buffer_size(config.socket_buffer_size)
        .build_layer();

    let server_state = setup_shared_state(config.clone(), io).await?;
    let app = create_router(server_state).layer(layer);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("🌐 Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("👋 Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received.");
}

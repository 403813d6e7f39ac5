use std::net::SocketAddr;

use gvms_proxy::middleware::{ProxyConfig, proxy_routes};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gvms_proxy=info,tower_http=info")),
        )
        .init();

    let config = ProxyConfig::from_env()?;
    if config.server_token().is_some() {
        tracing::debug!("SERVER_TOKEN loaded");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let app = proxy_routes(config).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Started GVMS proxy");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}

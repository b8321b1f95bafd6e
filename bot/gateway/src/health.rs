//! Liveness endpoint for the hosting platform.

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/health", get(|| async { "OK" }));
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Health check server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

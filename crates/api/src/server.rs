//! HTTP server bootstrap.

use axum::Router;
use tokio::net::TcpListener;

/// Initialise observability and serve `app` until the listener fails.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    platform_observability::init();

    match listener.local_addr() {
        Ok(addr) => tracing::info!("listening on {}", addr),
        Err(err) => tracing::warn!(error = %err, "listening on unknown address"),
    }

    axum::serve(listener, app).await
}

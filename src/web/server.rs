//! HTTP server lifecycle

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::tools::factory::ToolsFactory;
use crate::web::routes::router;

/// Serves the routes on `listen` until Ctrl-C.
pub async fn serve(listen: &str, factory: Arc<dyn ToolsFactory>) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(factory))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

//! HTTP boundary of the resolver.
//!
//! Exposes the single entry point consumed by the viewer front-end:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /resolve/{token}` | `application/pdf` body (byte strategy) or `{"pdf": url}` (URL strategy) |
//! | `GET /health` | `{"status": "healthy", "version": ...}` |
//!
//! Failures are `{"error": message, "kind": kind}` with the status carried by
//! the failing stage.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, response encoding, and the listener loop live
//! here. All resolve semantics belong to [`stages::Resolver`].

pub mod error;
pub mod handlers;
pub mod state;

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/resolve/{token}", get(handlers::resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `addr` until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}

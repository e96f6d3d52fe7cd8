//! Router assembly and graceful shutdown.

use axum::Router;
use axum::middleware;
use tokio::signal;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::auth::middleware::require_login;
use crate::dashboard;
use crate::web;

/// Build the combined application router with all middleware layers.
pub fn build_app(state: AppState) -> Router {
    // -- Request ID layer (X-Request-ID) --------------------------------------
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // -- Tracing layer --------------------------------------------------------
    let trace = TraceLayer::new_for_http();

    // -- Session-protected routes ---------------------------------------------
    let protected = web::protected_routes()
        .merge(dashboard::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .merge(web::public_routes())
        .merge(protected)
        .fallback(web::not_found)
        // Global middleware stack (applied to all routes)
        .layer(propagate_id)
        .layer(trace)
        .layer(request_id)
        .with_state(state)
}

/// Wait for a shutdown signal (SIGTERM or SIGINT / Ctrl+C).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C)");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}

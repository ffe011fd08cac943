use std::net::SocketAddr;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;

use crate::handlers::{
    categories::{create_category, delete_category, list_categories, update_category},
    health::health_check,
    notes::{create_note, delete_note, list_notes, search_notes, update_note},
    profile::{get_profile, update_profile},
    session::{login, logout, register, verify},
    transfer::{export_notes, import_notes},
};
use crate::middleware::{RequestIdLayer, log_requests};
use crate::state::AppState;

/// Creates the application router. Used directly by tests; the binary
/// wraps it with the metrics endpoint via `create_router_with_metrics`.
pub fn create_router(state: AppState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(middleware::from_fn(log_requests));

    Router::new()
        .route("/health", get(health_check))
        // Sessions
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/verify", get(verify))
        // Notes
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/search", get(search_notes))
        .route("/api/notes/{id}", put(update_note).delete(delete_note))
        // Categories
        .route(
            "/api/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/categories/{id}",
            put(update_category).delete(delete_category),
        )
        // Profile
        .route("/api/user/profile", get(get_profile).put(update_profile))
        // Markdown transfer
        .route("/api/export", post(export_notes))
        .route("/api/import", post(import_notes))
        .with_state(state)
        .layer(middleware_stack)
}

/// Creates the full router with the Prometheus metrics endpoint and the
/// HTTP metrics middleware.
pub fn create_router_with_metrics(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(crate::handlers::metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(create_router(state))
        .merge(metrics_router)
        .layer(middleware::from_fn(
            crate::metrics::http::http_metrics_middleware,
        ))
}

/// Runs the server with graceful shutdown.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    prometheus_handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = create_router_with_metrics(state, prometheus_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

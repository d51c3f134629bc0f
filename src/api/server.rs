//! HTTP server implementation for the sledge API

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, put},
    Router,
};
use std::future::Future;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::core::{AppState, Result};

/// Creates the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        // System routes
        .route("/healthz", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Database routes
        .route("/_db/_all", get(handlers::list_databases))
        .route(
            "/_db/:db",
            put(handlers::write_document).get(handlers::read_without_id),
        )
        .route(
            "/_db/:db/:token",
            put(handlers::write_document_at)
                .get(handlers::read_documents)
                .post(handlers::transform_documents),
        )
        // Stored channels
        .route("/_channel/:name", put(handlers::put_channel))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Start the HTTP server and run until `shutdown` resolves
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.server.http_addr;
    tracing::info!("Starting sledge API server on {}", addr);

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/healthz", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    tracing::info!("Server stopped");
    Ok(())
}

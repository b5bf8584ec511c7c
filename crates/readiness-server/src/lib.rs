pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/catalog", get(routes::catalog::get_catalog))
        // Assessments
        .route("/api/assessments", get(routes::assessment::list_assessments))
        .route(
            "/api/assessment/start",
            post(routes::assessment::start_assessment),
        )
        .route(
            "/api/assessment/{id}/next",
            get(routes::assessment::next_question),
        )
        .route(
            "/api/assessment/{id}/answer",
            post(routes::assessment::submit_answer),
        )
        .route(
            "/api/assessment/{id}/status",
            get(routes::assessment::get_status),
        )
        .route(
            "/api/assessment/{id}/results",
            get(routes::assessment::get_results),
        )
        .route(
            "/api/assessment/{id}/readiness",
            get(routes::assessment::get_readiness),
        )
        // Guidance
        .route(
            "/api/assessment/{id}/guidance",
            post(routes::guidance::get_guidance),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Load the project at `root` and serve it on `host:port`.
pub async fn serve(root: PathBuf, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    serve_on(root, listener).await
}

/// Serve on a pre-bound listener so the caller can read the actual port
/// first (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app_state = tokio::task::spawn_blocking(move || AppState::load(root)).await??;
    let app = build_router(app_state);

    tracing::info!("readiness server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

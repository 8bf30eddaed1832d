// File: manager/src/web/server.rs
use crate::constants::defaults;
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === JOB ROUTES ===
        .route(
            "/api/jobs",
            get(handlers::list_jobs).post(handlers::create_job),
        )
        .route("/api/jobs/history", get(handlers::get_history))
        .route("/api/jobs/{job_id}", delete(handlers::delete_job))
        .route("/api/clusters", get(handlers::get_clusters))
        // === CONTAINER ROUTES ===
        .route("/api/container/list", get(handlers::list_containers))
        .route("/api/container", post(handlers::manage_container))
        .route("/api/time", get(handlers::get_time))
        // === STATIC FILES ===
        .nest_service("/static", ServeDir::new(defaults::STATIC_DIR))
        // Add middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

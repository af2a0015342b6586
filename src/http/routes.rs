use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/v1/upload-session", post(handlers::create_session))
        .route("/v1/session/:session_id", get(handlers::get_session))
        .route("/v1/session/:session_id", delete(handlers::delete_session))
        .route(
            "/v1/session/:session_id/chunks",
            get(handlers::list_chunks),
        )
        .route(
            "/v1/session/:session_id/assemble",
            post(handlers::assemble_session),
        )
        .route("/v1/session/:session_id/fail", post(handlers::fail_session))
        .route(
            "/v1/fetch-session-by-patient/:patient_id",
            get(handlers::sessions_by_patient),
        )
        // Chunk upload
        .route("/v1/get-presigned-url", post(handlers::get_presigned_url))
        .route("/v1/storage/upload/:token", put(handlers::upload_chunk))
        .route(
            "/v1/notify-chunk-uploaded",
            post(handlers::notify_chunk_uploaded),
        )
        // Public file access
        .route(
            "/v1/storage/public/:session_id/:filename",
            get(handlers::get_public_file),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! HTTP API server for the recording client
//!
//! This module provides the REST surface over the upload/session core:
//! - POST /v1/upload-session - Create a recording session
//! - POST /v1/get-presigned-url - Issue a chunk upload authorization
//! - PUT  /v1/storage/upload/:token - Submit chunk bytes
//! - POST /v1/notify-chunk-uploaded - Register a chunk / completion signal
//! - GET  /v1/session/:id, /chunks - Session queries
//! - POST /v1/session/:id/assemble - Build the complete artifact
//! - GET  /v1/storage/public/:id/:filename - Serve stored audio
//! - GET  /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

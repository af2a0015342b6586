use super::state::AppState;
use crate::error::ScribeError;
use crate::session::{ChunkRecord, NewSession, RegisterChunk, Session};
use crate::storage::{self, BlobContent};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub template_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlRequest {
    pub session_id: String,
    pub chunk_number: u32,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlResponse {
    pub url: String,
    pub storage_path: String,
    pub public_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadChunkResponse {
    pub session_id: String,
    pub chunk_number: u32,
    pub storage_path: String,
    pub public_url: Option<String>,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyChunkRequest {
    pub session_id: String,
    pub chunk_number: u32,
    pub storage_path: String,
    pub public_url: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    #[serde(default)]
    pub is_last: bool,
    pub selected_template_id: Option<String>,
    pub selected_template: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChunkListResponse {
    pub chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleResponse {
    pub path: String,
    pub size: u64,
    pub public_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map the core error taxonomy onto HTTP status codes.
fn error_response(err: ScribeError) -> Response {
    let status = match &err {
        ScribeError::SessionNotFound(_) | ScribeError::BlobNotFound(_) => StatusCode::NOT_FOUND,
        ScribeError::InvalidState { .. } => StatusCode::CONFLICT,
        ScribeError::InvalidToken => StatusCode::UNAUTHORIZED,
        ScribeError::ExpiredToken => StatusCode::GONE,
        ScribeError::IncompleteManifest { .. } => StatusCode::CONFLICT,
        ScribeError::Io { .. } | ScribeError::Remote(_) | ScribeError::RemoteRejected(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/upload-session
/// Create a new recording session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let session = state
        .service
        .create_session(NewSession {
            user_id: req.user_id,
            patient_id: req.patient_id,
            patient_name: req.patient_name,
            start_time: req.start_time,
            template_id: req.template_id,
        })
        .await;

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse { id: session.id }),
    )
        .into_response()
}

/// POST /v1/get-presigned-url
/// Issue a time-limited, single-use upload authorization for one chunk
pub async fn get_presigned_url(
    State(state): State<AppState>,
    Json(req): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    let mime_type = req.mime_type.as_deref().unwrap_or("audio/wav");

    match state
        .service
        .request_upload_authorization(&req.session_id, req.chunk_number, mime_type)
        .await
    {
        Ok(issued) => (
            StatusCode::OK,
            Json(PresignedUrlResponse {
                url: issued.upload_url,
                storage_path: issued.storage_path,
                public_url: issued.public_url,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /v1/storage/upload/:token
/// Accept raw chunk bytes for a presigned upload
pub async fn upload_chunk(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    match state.service.submit_uploaded_bytes(&token, &body).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(UploadChunkResponse {
                session_id: receipt.session_id,
                chunk_number: receipt.chunk_index,
                storage_path: receipt.storage_path,
                public_url: receipt.public_url,
                size: receipt.size,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /v1/notify-chunk-uploaded
/// Register an uploaded chunk against its session; `isLast` closes the session
pub async fn notify_chunk_uploaded(
    State(state): State<AppState>,
    Json(req): Json<NotifyChunkRequest>,
) -> impl IntoResponse {
    let reg = RegisterChunk {
        chunk_index: req.chunk_number,
        storage_path: req.storage_path,
        public_url: req.public_url,
        mime_type: req.mime_type.unwrap_or_else(|| "audio/wav".to_string()),
        size: req.size.unwrap_or(0),
        is_last: req.is_last,
        template_id: req.selected_template_id,
        template_name: req.selected_template,
    };

    match state
        .service
        .report_chunk_complete(&req.session_id, reg)
        .await
    {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/session/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.service.get_session(&session_id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/session/:session_id/chunks
pub async fn list_chunks(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.service.list_chunks(&session_id).await {
        Ok(chunks) => (StatusCode::OK, Json(ChunkListResponse { chunks })).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/fetch-session-by-patient/:patient_id
pub async fn sessions_by_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.service.sessions_for_patient(&patient_id).await;
    (StatusCode::OK, Json(SessionListResponse { sessions })).into_response()
}

/// POST /v1/session/:session_id/assemble
/// Concatenate all chunks into the session's complete artifact
pub async fn assemble_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.service.assemble_session(&session_id).await {
        Ok(artifact) => (
            StatusCode::OK,
            Json(AssembleResponse {
                path: artifact.path,
                size: artifact.size,
                public_url: artifact.public_url,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /v1/session/:session_id/fail
/// External failure signal (e.g. the processing pipeline gave up)
pub async fn fail_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.service.fail_session(&session_id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /v1/session/:session_id
/// Administrative deletion of the session document and its blobs
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.service.delete_session(&session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/storage/public/:session_id/:filename
/// Serve stored audio: raw bytes from the local backend, a redirect to the
/// media host's playback URL from the remote one
pub async fn get_public_file(
    State(state): State<AppState>,
    Path((session_id, filename)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.service.fetch_blob(&session_id, &filename).await {
        Ok(BlobContent::Bytes(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, storage::content_type_for(&filename))],
            bytes,
        )
            .into_response(),
        Ok(BlobContent::Redirect(url)) => Redirect::temporary(&url).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

use crate::assembly::{self, AssembledArtifact};
use crate::error::{Result, ScribeError};
use crate::session::{ChunkRecord, NewSession, RegisterChunk, Session, SessionStore};
use crate::storage::{BlobContent, BlobStore};
use crate::token::{IssuedUpload, TokenStore, UploadGrant};
use std::sync::Arc;
use tracing::info;

/// Receipt handed back after a successful presigned upload, so the client can
/// report the chunk against its session.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub session_id: String,
    pub chunk_index: u32,
    pub storage_path: String,
    pub public_url: Option<String>,
    pub mime_type: String,
    pub size: u64,
}

/// The core seam the request layer calls into: wires the token store, blob
/// backend, session state machine, and assembly together.
pub struct ScribeService {
    sessions: Arc<SessionStore>,
    tokens: TokenStore,
    blobs: Arc<dyn BlobStore>,
}

impl ScribeService {
    pub fn new(sessions: Arc<SessionStore>, tokens: TokenStore, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            sessions,
            tokens,
            blobs,
        }
    }

    pub async fn create_session(&self, input: NewSession) -> Session {
        self.sessions.create(input).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.sessions.get(session_id).await
    }

    pub async fn list_chunks(&self, session_id: &str) -> Result<Vec<ChunkRecord>> {
        self.sessions.list_chunks(session_id).await
    }

    pub async fn sessions_for_patient(&self, patient_id: &str) -> Vec<Session> {
        self.sessions.by_patient(patient_id).await
    }

    /// Issue a time-limited, single-use authorization for one chunk upload.
    /// The session must exist.
    pub async fn request_upload_authorization(
        &self,
        session_id: &str,
        chunk_index: u32,
        mime_type: &str,
    ) -> Result<IssuedUpload> {
        if !self.sessions.exists(session_id).await {
            return Err(ScribeError::SessionNotFound(session_id.to_string()));
        }

        Ok(self.tokens.issue(session_id, chunk_index, mime_type))
    }

    /// Accept chunk bytes presented with an upload token.
    ///
    /// Validate, write, then consume; the token stays valid if the write
    /// fails, so the client can retry inside the expiry window. If a
    /// concurrent request spent the token first, this one is rejected even
    /// though its (identical-target) write landed.
    pub async fn submit_uploaded_bytes(&self, token: &str, bytes: &[u8]) -> Result<UploadReceipt> {
        let grant: UploadGrant = self.tokens.validate(token)?;

        let written = self.blobs.write(&grant.storage_path, bytes).await?;

        if !self.tokens.consume_once(token) {
            return Err(ScribeError::InvalidToken);
        }

        info!(
            "Stored chunk {} for session {} ({} bytes)",
            grant.chunk_index, grant.session_id, written.size
        );

        Ok(UploadReceipt {
            session_id: grant.session_id,
            chunk_index: grant.chunk_index,
            storage_path: grant.storage_path,
            public_url: written.public_url,
            mime_type: grant.mime_type,
            size: written.size,
        })
    }

    /// Register an uploaded chunk; a final chunk closes the session and
    /// schedules the detached completion step.
    pub async fn report_chunk_complete(
        &self,
        session_id: &str,
        reg: RegisterChunk,
    ) -> Result<Session> {
        let outcome = self.sessions.register_chunk(session_id, reg).await?;

        if outcome.closed {
            Arc::clone(&self.sessions).schedule_completion(session_id.to_string());
        }

        Ok(outcome.session)
    }

    /// Serve a session-scoped blob: bytes from the local backend, a redirect
    /// locator from the remote one.
    pub async fn fetch_blob(&self, session_id: &str, filename: &str) -> Result<BlobContent> {
        self.blobs.read(session_id, filename).await
    }

    pub async fn assemble_session(&self, session_id: &str) -> Result<AssembledArtifact> {
        assembly::assemble(&self.sessions, self.blobs.as_ref(), session_id).await
    }

    pub async fn fail_session(&self, session_id: &str) -> Result<Session> {
        self.sessions.fail(session_id).await
    }

    /// Administrative deletion: drop the document, then best-effort blob
    /// cleanup.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.sessions
            .remove(session_id)
            .await
            .ok_or_else(|| ScribeError::SessionNotFound(session_id.to_string()))?;

        self.blobs.delete_session(session_id).await;
        Ok(())
    }
}

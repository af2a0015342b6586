use super::model::{
    format_duration, ChunkRecord, NewSession, RegisterChunk, Session, SessionStatus,
    TranscriptStatus, DEFAULT_SESSION_TITLE,
};
use crate::error::{Result, ScribeError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// In-memory session document store and state machine.
///
/// The session is the unit of consistency: every mutation is a single
/// read-modify-write under the map's write lock, so concurrent chunk
/// registrations for one session serialize and never lose manifest updates.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,

    /// Fixed delay before the detached completion step runs
    processing_delay: Duration,
}

/// Result of a chunk registration.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub session: Session,
    /// True when this registration closed the session (`recording -> processing`)
    /// and the caller should schedule the completion step.
    pub closed: bool,
}

impl SessionStore {
    pub fn new(processing_delay: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            processing_delay,
        }
    }

    /// Create a session in `recording` state with an empty manifest.
    pub async fn create(&self, input: NewSession) -> Session {
        let session = Session::new(input);

        info!(
            "Created session {} for patient {}",
            session.id, session.patient_id
        );

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub async fn get(&self, session_id: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| ScribeError::SessionNotFound(session_id.to_string()))
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(session_id)
    }

    /// Manifest for a session, sorted by chunk index.
    pub async fn list_chunks(&self, session_id: &str) -> Result<Vec<ChunkRecord>> {
        Ok(self.get(session_id).await?.sorted_chunks())
    }

    /// Sessions for one patient, most recent first.
    pub async fn by_patient(&self, patient_id: &str) -> Vec<Session> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|s| s.patient_id == patient_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        matching
    }

    /// Upsert the chunk at `chunk_index` and apply the completion signal.
    ///
    /// Duplicate indices overwrite the prior record (client retries);
    /// `total_chunks` only ever moves up. `is_last` closes the session while
    /// it is still recording; a retried final chunk during processing is a
    /// plain upsert.
    pub async fn register_chunk(
        &self,
        session_id: &str,
        reg: RegisterChunk,
    ) -> Result<RegisterOutcome> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ScribeError::SessionNotFound(session_id.to_string()))?;

        if session.status.is_terminal() {
            return Err(ScribeError::InvalidState {
                id: session_id.to_string(),
                status: session.status,
            });
        }

        let now = Utc::now();
        let record = ChunkRecord {
            chunk_index: reg.chunk_index,
            storage_path: reg.storage_path,
            public_url: reg.public_url,
            mime_type: reg.mime_type,
            size: reg.size,
            uploaded_at: now,
        };

        match session
            .chunks
            .iter_mut()
            .find(|c| c.chunk_index == reg.chunk_index)
        {
            Some(existing) => *existing = record,
            None => session.chunks.push(record),
        }

        // Index is caller-supplied; an index of u32::MAX must not overflow the
        // high-water mark.
        session.total_chunks = session
            .total_chunks
            .max(reg.chunk_index.saturating_add(1));

        let closed = reg.is_last && session.status == SessionStatus::Recording;
        if closed {
            session.is_complete = true;
            session.status = SessionStatus::Processing;
            session.end_time = Some(now);

            let elapsed = (now - session.start_time).num_seconds();
            session.duration = Some(format_duration(elapsed));

            if let Some(template_id) = reg.template_id {
                session.template_id = Some(template_id);
                session.session_title = reg
                    .template_name
                    .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());
            }

            info!(
                "Session {} closed: {} chunks declared, duration {}",
                session.id,
                session.total_chunks,
                session.duration.as_deref().unwrap_or("?")
            );
        }

        session.updated_at = now;

        Ok(RegisterOutcome {
            session: session.clone(),
            closed,
        })
    }

    /// Mark a session failed. Terminal sessions reject the transition.
    pub async fn fail(&self, session_id: &str) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ScribeError::SessionNotFound(session_id.to_string()))?;

        if session.status.is_terminal() {
            return Err(ScribeError::InvalidState {
                id: session_id.to_string(),
                status: session.status,
            });
        }

        session.status = SessionStatus::Failed;
        session.transcript_status = TranscriptStatus::Failed;
        session.updated_at = Utc::now();

        warn!("Session {} marked failed", session_id);

        Ok(session.clone())
    }

    /// Remove a session document (administrative deletion).
    pub async fn remove(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    /// Spawn the detached completion step for a just-closed session.
    ///
    /// After the processing delay it re-fetches the session and finishes the
    /// transcription stub only if the session still exists and is still
    /// `processing`. A session deleted or failed in the meantime is left
    /// alone. The task holds no session lock while sleeping.
    pub fn schedule_completion(self: Arc<Self>, session_id: String) {
        let store = self;
        let delay = store.processing_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut sessions = store.sessions.write().await;
            match sessions.get_mut(&session_id) {
                Some(session) if session.status == SessionStatus::Processing => {
                    session.status = SessionStatus::Completed;
                    session.transcript_status = TranscriptStatus::Completed;
                    session.transcript =
                        Some(format!("[Simulated transcript for session {}]", session_id));
                    session.updated_at = Utc::now();

                    info!("Session {} status updated to completed", session_id);
                }
                Some(session) => {
                    warn!(
                        "Completion step skipped: session {} is {}",
                        session_id, session.status
                    );
                }
                None => {
                    warn!(
                        "Completion step skipped: session {} no longer exists",
                        session_id
                    );
                }
            }
        });
    }
}

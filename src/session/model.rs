use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a recording session.
///
/// Transitions only move forward (`recording -> processing -> completed`),
/// except that `failed` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Recording,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Terminal sessions accept no further chunk registration or transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Recording => "recording",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Progress of the derived transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One uploaded segment of a recording, keyed by its caller-assigned index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk index (0-based, assigned by the recording client)
    pub chunk_index: u32,

    /// Backend storage path, e.g. `sessions/{id}/chunk_0.wav`
    pub storage_path: String,

    /// Public playback locator, when the backend provides one
    pub public_url: Option<String>,

    /// Declared content type of the uploaded bytes
    pub mime_type: String,

    /// Size in bytes as written by the blob store
    pub size: u64,

    /// When the upload was reported
    pub uploaded_at: DateTime<Utc>,
}

/// A recording session document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub session_title: String,
    pub status: SessionStatus,
    pub transcript_status: TranscriptStatus,
    pub transcript: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Calendar date of `start_time` (YYYY-MM-DD)
    pub date: String,
    /// Elapsed recording time as `m:ss`, set when the session closes
    pub duration: Option<String>,
    pub template_id: Option<String>,
    /// Chunk manifest in arrival order; read paths sort by index
    pub chunks: Vec<ChunkRecord>,
    /// High-water mark: 1 + highest chunk index declared so far
    pub total_chunks: u32,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_SESSION_TITLE: &str = "Medical Consultation";

/// Inputs for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub template_id: Option<String>,
}

/// Inputs for registering an uploaded chunk against a session.
#[derive(Debug, Clone)]
pub struct RegisterChunk {
    pub chunk_index: u32,
    pub storage_path: String,
    pub public_url: Option<String>,
    pub mime_type: String,
    pub size: u64,
    /// Explicit completion signal from the client; this alone closes the
    /// session, regardless of manifest density.
    pub is_last: bool,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
}

impl Session {
    pub fn new(input: NewSession) -> Self {
        let now = Utc::now();
        let start_time = input.start_time.unwrap_or(now);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: input.user_id,
            patient_id: input.patient_id,
            patient_name: input.patient_name,
            session_title: DEFAULT_SESSION_TITLE.to_string(),
            status: SessionStatus::Recording,
            transcript_status: TranscriptStatus::Pending,
            transcript: None,
            date: start_time.format("%Y-%m-%d").to_string(),
            start_time,
            end_time: None,
            duration: None,
            template_id: input.template_id,
            chunks: Vec::new(),
            total_chunks: 0,
            is_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Manifest sorted strictly by chunk index ascending.
    pub fn sorted_chunks(&self) -> Vec<ChunkRecord> {
        let mut chunks = self.chunks.clone();
        chunks.sort_by_key(|c| c.chunk_index);
        chunks
    }
}

/// Format an elapsed recording time as `m:ss` (seconds zero-padded).
pub fn format_duration(elapsed_secs: i64) -> String {
    let elapsed_secs = elapsed_secs.max(0);
    format!("{}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(5), "0:05");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(600), "10:00");
        assert_eq!(format_duration(3605), "60:05");
    }

    #[test]
    fn test_format_duration_clamps_negative() {
        // Clock skew between start and end must not produce "-1:-05"
        assert_eq!(format_duration(-65), "0:00");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionStatus::Recording.is_terminal());
        assert!(!SessionStatus::Processing.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new(NewSession {
            user_id: "user-1".to_string(),
            patient_id: "patient-1".to_string(),
            patient_name: "Jane Doe".to_string(),
            start_time: None,
            template_id: None,
        });

        assert_eq!(session.status, SessionStatus::Recording);
        assert_eq!(session.transcript_status, TranscriptStatus::Pending);
        assert_eq!(session.session_title, DEFAULT_SESSION_TITLE);
        assert_eq!(session.total_chunks, 0);
        assert!(session.chunks.is_empty());
        assert!(!session.is_complete);
        assert!(session.end_time.is_none());
        assert!(session.duration.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}

//! Blob storage for chunk bytes and assembled artifacts
//!
//! Two interchangeable backends sit behind the `BlobStore` trait: a local
//! hierarchical store under a root directory, and a remote hosted-media
//! backend that hands out direct playback URLs instead of proxying bytes.
//! The backend is picked once at startup; call sites never branch on it.

mod local;
mod remote;

use crate::config::{StorageBackendKind, StorageConfig};
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

pub use local::LocalBlobStore;
pub use remote::RemoteMediaStore;

/// What a read returns: raw bytes (local backend) or a redirect-style
/// locator the caller should follow (remote backend).
#[derive(Debug, Clone)]
pub enum BlobContent {
    Bytes(Vec<u8>),
    Redirect(String),
}

/// Result of a durable write.
#[derive(Debug, Clone)]
pub struct BlobWrite {
    pub size: u64,
    /// Public playback locator, when the backend provides one
    pub public_url: Option<String>,
}

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Durably persist bytes at `path`, creating parents and overwriting any
    /// existing blob (chunk retries land on the same path).
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<BlobWrite>;

    /// Fetch a session-scoped blob for serving to a client.
    async fn read(&self, session_id: &str, filename: &str) -> Result<BlobContent>;

    /// Raw bytes by storage path, for assembly.
    async fn read_path(&self, path: &str) -> Result<Vec<u8>>;

    /// Best-effort removal of everything under a session. Failures are
    /// logged, never propagated.
    async fn delete_session(&self, session_id: &str);

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Blob store factory: selects the backend from deployment config.
pub struct BlobStoreFactory;

impl BlobStoreFactory {
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
        let store: Arc<dyn BlobStore> = match config.backend {
            StorageBackendKind::Local => Arc::new(LocalBlobStore::new(
                &config.root,
                config.base_url.clone(),
            )?),
            StorageBackendKind::Remote => Arc::new(RemoteMediaStore::new(config.remote.clone())),
        };

        info!("Blob storage backend: {}", store.name());
        Ok(store)
    }
}

/// Extension for a declared content type; unrecognized types fall back to wav.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/aac" => "aac",
        _ => "wav",
    }
}

/// Content type for serving a stored file back, from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        _ => "audio/wav",
    }
}

pub fn chunk_filename(chunk_index: u32, mime_type: &str) -> String {
    format!("chunk_{}.{}", chunk_index, extension_for(mime_type))
}

/// `sessions/{session_id}/chunk_{index}.{ext}`
pub fn chunk_path(session_id: &str, chunk_index: u32, mime_type: &str) -> String {
    format!(
        "sessions/{}/{}",
        session_id,
        chunk_filename(chunk_index, mime_type)
    )
}

/// `sessions/{session_id}/complete.{ext}`
pub fn artifact_path(session_id: &str, extension: &str) -> String {
    format!("sessions/{}/complete.{}", session_id, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(extension_for("audio/wav"), "wav");
        assert_eq!(extension_for("audio/wave"), "wav");
        assert_eq!(extension_for("audio/mpeg"), "mp3");
        assert_eq!(extension_for("audio/mp3"), "mp3");
        assert_eq!(extension_for("audio/mp4"), "m4a");
        assert_eq!(extension_for("audio/x-m4a"), "m4a");
        assert_eq!(extension_for("audio/aac"), "aac");
        assert_eq!(extension_for("application/octet-stream"), "wav");
    }

    #[test]
    fn test_path_scheme() {
        assert_eq!(chunk_path("abc", 0, "audio/wav"), "sessions/abc/chunk_0.wav");
        assert_eq!(chunk_path("abc", 12, "audio/mp4"), "sessions/abc/chunk_12.m4a");
        assert_eq!(artifact_path("abc", "wav"), "sessions/abc/complete.wav");
    }

    #[test]
    fn test_content_type_round_trip() {
        assert_eq!(content_type_for("chunk_0.wav"), "audio/wav");
        assert_eq!(content_type_for("chunk_1.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("complete"), "audio/wav");
    }
}

use crate::error::{Result, ScribeError};
use crate::session::SessionStore;
use crate::storage::{self, BlobStore};
use tracing::info;

/// The assembled recording artifact.
#[derive(Debug, Clone)]
pub struct AssembledArtifact {
    pub path: String,
    pub size: u64,
    pub public_url: Option<String>,
}

/// Concatenate a session's chunks into one continuous artifact.
///
/// Chunks are read strictly in index order and joined byte-for-byte with no
/// framing, then written to `sessions/{id}/complete.{ext}`. Re-running with an
/// unchanged manifest overwrites the artifact with identical bytes.
pub async fn assemble(
    sessions: &SessionStore,
    blobs: &dyn BlobStore,
    session_id: &str,
) -> Result<AssembledArtifact> {
    let session = sessions.get(session_id).await?;
    let chunks = session.sorted_chunks();

    let extension = chunks
        .first()
        .map(|c| storage::extension_for(&c.mime_type))
        .unwrap_or("wav");

    let mut combined = Vec::new();
    for chunk in &chunks {
        let bytes = blobs.read_path(&chunk.storage_path).await.map_err(|e| {
            match e {
                ScribeError::BlobNotFound(path) => ScribeError::IncompleteManifest {
                    index: chunk.chunk_index,
                    path,
                },
                other => other,
            }
        })?;
        combined.extend_from_slice(&bytes);
    }

    let path = storage::artifact_path(session_id, extension);
    let written = blobs.write(&path, &combined).await?;

    info!(
        "Assembled session {}: {} chunks, {} bytes -> {}",
        session_id,
        chunks.len(),
        written.size,
        path
    );

    Ok(AssembledArtifact {
        path,
        size: written.size,
        public_url: written.public_url,
    })
}

use super::{BlobContent, BlobStore, BlobWrite};
use crate::error::{Result, ScribeError};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Filesystem-backed blob store rooted at a storage directory.
///
/// Blobs live at `{root}/sessions/{session_id}/{filename}`; public URLs point
/// back at this service's public-file route.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    pub fn new(root: impl AsRef<Path>, public_base: String) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        std::fs::create_dir_all(&root)
            .map_err(|e| ScribeError::io(root.display().to_string(), e))?;

        info!("Local storage directory initialized: {}", root.display());

        Ok(Self { root, public_base })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn public_url(&self, session_id: &str, filename: &str) -> String {
        format!(
            "{}/v1/storage/public/{}/{}",
            self.public_base, session_id, filename
        )
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<BlobWrite> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScribeError::io(parent.display().to_string(), e))?;
        }

        tokio::fs::write(&full_path, bytes)
            .await
            .map_err(|e| ScribeError::io(path.to_string(), e))?;

        let public_url = path
            .strip_prefix("sessions/")
            .and_then(|rest| rest.split_once('/'))
            .map(|(session_id, filename)| self.public_url(session_id, filename));

        Ok(BlobWrite {
            size: bytes.len() as u64,
            public_url,
        })
    }

    async fn read(&self, session_id: &str, filename: &str) -> Result<BlobContent> {
        let path = format!("sessions/{}/{}", session_id, filename);
        Ok(BlobContent::Bytes(self.read_path(&path).await?))
    }

    async fn read_path(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);

        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScribeError::BlobNotFound(path.to_string()))
            }
            Err(e) => Err(ScribeError::io(path.to_string(), e)),
        }
    }

    async fn delete_session(&self, session_id: &str) {
        let session_dir = self.root.join("sessions").join(session_id);

        match tokio::fs::remove_dir_all(&session_dir).await {
            Ok(()) => info!("Deleted local blobs for session {}", session_id),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!(
                "Failed to delete local blobs for session {}: {}",
                session_id, e
            ),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

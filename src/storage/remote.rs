use super::{BlobContent, BlobStore, BlobWrite};
use crate::config::RemoteMediaConfig;
use crate::error::{Result, ScribeError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Hosted-media backend.
///
/// Chunks are pushed to the media host's API under a derived resource id and
/// served to clients straight from the host's playback URLs, so reads return
/// a redirect locator instead of moving bytes through this process. Assembly
/// still needs raw bytes and fetches them from the playback URL.
pub struct RemoteMediaStore {
    client: reqwest::Client,
    config: RemoteMediaConfig,
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    resource_id: &'a str,
    format: &'a str,
    /// Base64-encoded payload
    data: String,
    overwrite: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl RemoteMediaStore {
    pub fn new(config: RemoteMediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Media-host resource id for a storage path: the path under the
    /// configured folder, without the file extension.
    fn resource_id(&self, path: &str) -> String {
        let stem = path.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(path);
        format!("{}/{}", self.config.folder, stem)
    }

    fn playback_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.config.playback_base, self.config.folder, path)
    }
}

#[async_trait::async_trait]
impl BlobStore for RemoteMediaStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<BlobWrite> {
        let extension = path.rsplit('.').next().unwrap_or("wav");
        let body = UploadRequest {
            resource_id: &self.resource_id(path),
            format: extension,
            data: BASE64.encode(bytes),
            overwrite: true,
        };

        let response = self
            .client
            .post(format!("{}/v1/media", self.config.api_base))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScribeError::RemoteRejected(format!(
                "upload of {} returned {}",
                path,
                response.status()
            )));
        }

        let uploaded: UploadResponse = response.json().await?;

        info!("Uploaded {} to media host ({} bytes)", path, bytes.len());

        Ok(BlobWrite {
            size: bytes.len() as u64,
            public_url: Some(uploaded.secure_url),
        })
    }

    async fn read(&self, session_id: &str, filename: &str) -> Result<BlobContent> {
        let path = format!("sessions/{}/{}", session_id, filename);
        Ok(BlobContent::Redirect(self.playback_url(&path)))
    }

    async fn read_path(&self, path: &str) -> Result<Vec<u8>> {
        let response = self.client.get(self.playback_url(path)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ScribeError::BlobNotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(ScribeError::RemoteRejected(format!(
                "fetch of {} returned {}",
                path,
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn delete_session(&self, session_id: &str) {
        let prefix = format!("{}/sessions/{}", self.config.folder, session_id);

        let result = self
            .client
            .delete(format!("{}/v1/media", self.config.api_base))
            .query(&[("prefix", prefix.as_str())])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Deleted media-host resources for session {}", session_id)
            }
            Ok(response) => error!(
                "Media-host delete for session {} returned {}",
                session_id,
                response.status()
            ),
            Err(e) => error!(
                "Failed to delete media-host resources for session {}: {}",
                session_id, e
            ),
        }
    }

    fn name(&self) -> &str {
        "remote-media"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RemoteMediaStore {
        RemoteMediaStore::new(RemoteMediaConfig {
            api_base: "https://media.example.com".to_string(),
            playback_base: "https://cdn.example.com".to_string(),
            folder: "clinic".to_string(),
        })
    }

    #[test]
    fn test_resource_id_strips_extension() {
        let store = store();
        assert_eq!(
            store.resource_id("sessions/s1/chunk_0.wav"),
            "clinic/sessions/s1/chunk_0"
        );
    }

    #[test]
    fn test_playback_url() {
        let store = store();
        assert_eq!(
            store.playback_url("sessions/s1/chunk_0.wav"),
            "https://cdn.example.com/clinic/sessions/s1/chunk_0.wav"
        );
    }
}

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub session: SessionTuning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Root directory for the local backend
    pub root: String,
    /// Public base URL of this service (used in presigned and public URLs)
    pub base_url: String,
    /// Remote media host settings; required when backend = "remote"
    #[serde(default)]
    pub remote: RemoteMediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMediaConfig {
    pub api_base: String,
    pub playback_base: String,
    /// Top-level folder on the media host under which resources are keyed
    pub folder: String,
}

impl Default for RemoteMediaConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:9000".to_string(),
            playback_base: "http://localhost:9000/playback".to_string(),
            folder: "clinic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionTuning {
    /// Fixed delay before the stubbed transcription step completes a session
    pub processing_delay_secs: u64,
    /// Lifetime of an upload authorization
    pub token_ttl_minutes: i64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

use thiserror::Error;

use crate::session::SessionStatus;

/// Errors surfaced by the upload/session core.
///
/// The HTTP layer maps these onto status codes; callers inside the core
/// propagate them with `?`.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("blob not found: {0}")]
    BlobNotFound(String),

    #[error("session {id} is {status} and no longer accepts updates")]
    InvalidState { id: String, status: SessionStatus },

    #[error("invalid upload token")]
    InvalidToken,

    #[error("upload token has expired")]
    ExpiredToken,

    #[error("chunk {index} could not be read from storage: {path}")]
    IncompleteManifest { index: u32, path: String },

    #[error("storage I/O failed at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("remote media request failed")]
    Remote(#[from] reqwest::Error),

    #[error("remote media backend rejected the request: {0}")]
    RemoteRejected(String),
}

impl ScribeError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;

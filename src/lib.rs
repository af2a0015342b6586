pub mod assembly;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod session;
pub mod storage;
pub mod token;

pub use assembly::AssembledArtifact;
pub use config::Config;
pub use error::{Result, ScribeError};
pub use http::{create_router, AppState};
pub use service::{ScribeService, UploadReceipt};
pub use session::{
    ChunkRecord, NewSession, RegisterChunk, Session, SessionStatus, SessionStore, TranscriptStatus,
};
pub use storage::{BlobContent, BlobStore, BlobStoreFactory, BlobWrite, LocalBlobStore};
pub use token::{IssuedUpload, TokenStore, UploadGrant};

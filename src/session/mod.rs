//! Recording-session documents and the lifecycle state machine
//!
//! A session moves `recording -> processing -> completed`, with `failed`
//! reachable from any non-terminal state. Chunk registration is an idempotent
//! upsert keyed by (session, chunk index); the explicit `is_last` flag alone
//! closes the session and schedules the detached completion step.

mod model;
mod store;

pub use model::{
    format_duration, ChunkRecord, NewSession, RegisterChunk, Session, SessionStatus,
    TranscriptStatus, DEFAULT_SESSION_TITLE,
};
pub use store::{RegisterOutcome, SessionStore};

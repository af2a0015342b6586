use crate::error::{Result, ScribeError};
use crate::storage;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

const TOKEN_LEN: usize = 32;

/// What a token authorizes: one write of `mime_type` bytes to `storage_path`
/// on behalf of (session, chunk index), until `expires_at`.
#[derive(Debug, Clone)]
pub struct UploadGrant {
    pub session_id: String,
    pub chunk_index: u32,
    pub mime_type: String,
    pub storage_path: String,
    pub expires_at: DateTime<Utc>,
}

/// Everything the client needs to perform one chunk upload.
#[derive(Debug, Clone)]
pub struct IssuedUpload {
    pub token: String,
    /// Presigned-style endpoint the client PUTs bytes to
    pub upload_url: String,
    pub storage_path: String,
    pub public_url: String,
}

/// Short-lived, single-use upload authorizations.
///
/// Issuance and consumption are decoupled so a failed upload can retry with
/// the same token inside the expiry window, while `consume_once` guarantees a
/// token never acknowledges two writes. Expiry is checked lazily at
/// validation; there is no background sweep.
pub struct TokenStore {
    grants: Mutex<HashMap<String, UploadGrant>>,
    ttl: Duration,
    public_base: String,
}

impl TokenStore {
    pub fn new(ttl: Duration, public_base: impl Into<String>) -> Self {
        Self {
            grants: Mutex::new(HashMap::new()),
            ttl,
            public_base: public_base.into(),
        }
    }

    /// Issue a fresh authorization for (session, chunk index).
    ///
    /// The storage path is deterministic; the token is 256 bits from the OS
    /// RNG, so collisions and guessing are not a practical concern.
    pub fn issue(&self, session_id: &str, chunk_index: u32, mime_type: &str) -> IssuedUpload {
        let mut bytes = [0u8; TOKEN_LEN];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let storage_path = storage::chunk_path(session_id, chunk_index, mime_type);
        let filename = storage::chunk_filename(chunk_index, mime_type);
        let public_url = format!(
            "{}/v1/storage/public/{}/{}",
            self.public_base, session_id, filename
        );

        let grant = UploadGrant {
            session_id: session_id.to_string(),
            chunk_index,
            mime_type: mime_type.to_string(),
            storage_path: storage_path.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        info!(
            "Issued upload token for session {} chunk {} -> {}",
            session_id, chunk_index, storage_path
        );

        let mut grants = self.grants.lock().unwrap();
        grants.insert(token.clone(), grant);

        let upload_url = format!("{}/v1/storage/upload/{}", self.public_base, token);

        IssuedUpload {
            token,
            upload_url,
            storage_path,
            public_url,
        }
    }

    /// Look up a grant without consuming it.
    ///
    /// Unknown tokens fail with `InvalidToken`; expired ones are purged and
    /// fail with `ExpiredToken`, and can never validate again.
    pub fn validate(&self, token: &str) -> Result<UploadGrant> {
        let mut grants = self.grants.lock().unwrap();

        let grant = grants.get(token).ok_or(ScribeError::InvalidToken)?;

        if Utc::now() > grant.expires_at {
            grants.remove(token);
            return Err(ScribeError::ExpiredToken);
        }

        Ok(grant.clone())
    }

    /// Remove a spent grant after the bytes are durably written. Removal is
    /// idempotent; calling again for an already-spent token is harmless.
    ///
    /// Returns whether this call actually removed it: the loser of a
    /// concurrent double-spend sees `false` and must be rejected.
    pub fn consume_once(&self, token: &str) -> bool {
        let mut grants = self.grants.lock().unwrap();
        grants.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(Duration::minutes(15), "http://localhost:3000")
    }

    #[test]
    fn test_issue_generates_distinct_opaque_tokens() {
        let store = store();
        let a = store.issue("s1", 0, "audio/wav");
        let b = store.issue("s1", 0, "audio/wav");

        assert_ne!(a.token, b.token);
        // 32 bytes base64url without padding
        assert_eq!(a.token.len(), 43);
        assert_eq!(
            a.upload_url,
            format!("http://localhost:3000/v1/storage/upload/{}", a.token)
        );
        assert_eq!(a.storage_path, "sessions/s1/chunk_0.wav");
        assert_eq!(
            a.public_url,
            "http://localhost:3000/v1/storage/public/s1/chunk_0.wav"
        );
    }

    #[test]
    fn test_validate_unknown_token() {
        let store = store();
        assert!(matches!(
            store.validate("nope"),
            Err(ScribeError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_purged() {
        let store = TokenStore::new(Duration::seconds(-1), "http://localhost:3000");
        let issued = store.issue("s1", 0, "audio/wav");

        assert!(matches!(
            store.validate(&issued.token),
            Err(ScribeError::ExpiredToken)
        ));
        // Purged on first failed validation, unknown afterwards
        assert!(matches!(
            store.validate(&issued.token),
            Err(ScribeError::InvalidToken)
        ));
    }

    #[test]
    fn test_consume_once_rejects_second_spend() {
        let store = store();
        let issued = store.issue("s1", 3, "audio/mpeg");

        assert!(store.validate(&issued.token).is_ok());
        assert!(store.consume_once(&issued.token));
        assert!(!store.consume_once(&issued.token));
        assert!(matches!(
            store.validate(&issued.token),
            Err(ScribeError::InvalidToken)
        ));
    }
}

// Integration tests for chunk assembly
//
// Assembly reads the manifest in strict index order and concatenates chunk
// bytes with no framing, independent of the order chunks were registered.

use anyhow::Result;
use clinic_scribe::session::{NewSession, RegisterChunk, SessionStore};
use clinic_scribe::storage::{BlobStore, LocalBlobStore};
use clinic_scribe::{ScribeError, ScribeService, TokenStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn service(root: &Path) -> ScribeService {
    let blobs: Arc<dyn BlobStore> = Arc::new(
        LocalBlobStore::new(root, "http://localhost:3000".to_string()).expect("local store"),
    );
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(60)));
    let tokens = TokenStore::new(chrono::Duration::minutes(15), "http://localhost:3000");
    ScribeService::new(sessions, tokens, blobs)
}

fn new_session() -> NewSession {
    NewSession {
        user_id: "user-1".to_string(),
        patient_id: "patient-1".to_string(),
        patient_name: "Jane Doe".to_string(),
        start_time: None,
        template_id: None,
    }
}

/// Upload and register one chunk through the normal presigned flow.
async fn upload_chunk(
    service: &ScribeService,
    session_id: &str,
    index: u32,
    bytes: &[u8],
) -> Result<()> {
    let auth = service
        .request_upload_authorization(session_id, index, "audio/wav")
        .await?;
    let receipt = service.submit_uploaded_bytes(&auth.token, bytes).await?;

    service
        .report_chunk_complete(
            session_id,
            RegisterChunk {
                chunk_index: receipt.chunk_index,
                storage_path: receipt.storage_path,
                public_url: receipt.public_url,
                mime_type: receipt.mime_type,
                size: receipt.size,
                is_last: false,
                template_id: None,
                template_name: None,
            },
        )
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_assembly_concatenates_in_index_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let service = service(temp_dir.path());
    let session = service.create_session(new_session()).await;

    // Registered out of order on purpose
    upload_chunk(&service, &session.id, 2, b"C").await?;
    upload_chunk(&service, &session.id, 0, b"A").await?;
    upload_chunk(&service, &session.id, 1, b"B").await?;

    let artifact = service.assemble_session(&session.id).await?;
    assert_eq!(artifact.path, format!("sessions/{}/complete.wav", session.id));
    assert_eq!(artifact.size, 3);

    let artifact_file = temp_dir
        .path()
        .join("sessions")
        .join(&session.id)
        .join("complete.wav");
    let bytes = std::fs::read(artifact_file)?;
    assert_eq!(bytes, b"ABC", "concatenation with no separators");

    Ok(())
}

#[tokio::test]
async fn test_assembly_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let service = service(temp_dir.path());
    let session = service.create_session(new_session()).await;

    upload_chunk(&service, &session.id, 0, b"hello ").await?;
    upload_chunk(&service, &session.id, 1, b"world").await?;

    let first = service.assemble_session(&session.id).await?;
    let second = service.assemble_session(&session.id).await?;

    assert_eq!(first.path, second.path);
    assert_eq!(first.size, second.size);

    let artifact_file = temp_dir
        .path()
        .join("sessions")
        .join(&session.id)
        .join("complete.wav");
    assert_eq!(std::fs::read(artifact_file)?, b"hello world");

    Ok(())
}

#[tokio::test]
async fn test_assembly_fails_on_unreadable_chunk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let service = service(temp_dir.path());
    let session = service.create_session(new_session()).await;

    upload_chunk(&service, &session.id, 0, b"A").await?;

    // Registered but never uploaded
    service
        .report_chunk_complete(
            &session.id,
            RegisterChunk {
                chunk_index: 1,
                storage_path: format!("sessions/{}/chunk_1.wav", session.id),
                public_url: None,
                mime_type: "audio/wav".to_string(),
                size: 0,
                is_last: false,
                template_id: None,
                template_name: None,
            },
        )
        .await?;

    let result = service.assemble_session(&session.id).await;
    match result {
        Err(ScribeError::IncompleteManifest { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected IncompleteManifest, got {:?}", other.map(|a| a.path)),
    }

    Ok(())
}

#[tokio::test]
async fn test_assembly_unknown_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let service = service(temp_dir.path());

    let result = service.assemble_session("no-such-session").await;
    assert!(matches!(result, Err(ScribeError::SessionNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_assembly_of_empty_manifest_writes_empty_artifact() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let service = service(temp_dir.path());
    let session = service.create_session(new_session()).await;

    let artifact = service.assemble_session(&session.id).await?;
    assert_eq!(artifact.size, 0);
    assert!(artifact.path.ends_with("complete.wav"));

    Ok(())
}

#[tokio::test]
async fn test_artifact_extension_follows_chunk_mime_type() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let service = service(temp_dir.path());
    let session = service.create_session(new_session()).await;

    let auth = service
        .request_upload_authorization(&session.id, 0, "audio/mpeg")
        .await?;
    let receipt = service.submit_uploaded_bytes(&auth.token, b"mp3data").await?;
    service
        .report_chunk_complete(
            &session.id,
            RegisterChunk {
                chunk_index: 0,
                storage_path: receipt.storage_path,
                public_url: receipt.public_url,
                mime_type: receipt.mime_type,
                size: receipt.size,
                is_last: false,
                template_id: None,
                template_name: None,
            },
        )
        .await?;

    let artifact = service.assemble_session(&session.id).await?;
    assert_eq!(artifact.path, format!("sessions/{}/complete.mp3", session.id));

    Ok(())
}

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use clinic_scribe::storage::BlobStoreFactory;
use clinic_scribe::{create_router, AppState, Config, ScribeService, SessionStore, TokenStore};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "clinic-scribe", about = "Chunked audio upload and session service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/clinic-scribe")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("clinic-scribe v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let blobs = BlobStoreFactory::create(&cfg.storage)?;
    let sessions = Arc::new(SessionStore::new(std::time::Duration::from_secs(
        cfg.session.processing_delay_secs,
    )));
    let tokens = TokenStore::new(
        Duration::minutes(cfg.session.token_ttl_minutes),
        cfg.storage.base_url.clone(),
    );

    let service = Arc::new(ScribeService::new(sessions, tokens, blobs));
    let router = create_router(AppState::new(service));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .await
        .context("HTTP server error")?;

    Ok(())
}

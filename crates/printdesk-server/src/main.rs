//! # printdesk-server
//!
//! Backend for a print-shop order service.
//!
//! This binary provides:
//! - **Document uploads** (multipart, PDF/Word only, 10 MiB per file) stored
//!   under collision-resistant names in a flat directory
//! - **Order persistence** in a JSON document store with single-writer
//!   read-modify-write discipline and atomic replace-on-write
//! - **Admin login** against a seeded credential singleton, issuing expiring
//!   session tokens
//! - **REST API** (axum) for order creation, listing, status updates, file
//!   download and bulk cleanup

mod api;
mod auth;
mod config;
mod error;
mod uploads;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use printdesk_store::{AdminCredential, CredentialStore, OrderRepository};

use crate::api::AppState;
use crate::auth::SessionManager;
use crate::config::ServerConfig;
use crate::uploads::UploadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,printdesk_server=debug")),
        )
        .init();

    info!("Starting printdesk server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        upload_dir = %config.upload_dir.display(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize stores (directories and documents created if missing)
    // -----------------------------------------------------------------------
    let orders = Arc::new(OrderRepository::open(config.data_dir.join("orders.json")).await?);

    let credentials = Arc::new(
        CredentialStore::open(
            config.data_dir.join("admin.json"),
            AdminCredential {
                username: config.admin_username.clone(),
                password: config.admin_password.clone(),
            },
        )
        .await?,
    );

    let uploads = Arc::new(
        UploadStore::new(config.upload_dir.clone(), config.max_file_size)
            .await
            .map_err(|e| anyhow::anyhow!("upload store init failed: {}", e))?,
    );

    let sessions = SessionManager::new(config.session_ttl_secs);

    let http_addr = config.http_addr();
    let app_state = AppState {
        orders,
        credentials,
        uploads,
        sessions: sessions.clone(),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic session cleanup (every 10 minutes).
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            sessions.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

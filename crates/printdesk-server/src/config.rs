//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use printdesk_store::admin::{DEFAULT_PASSWORD, DEFAULT_USERNAME};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP API server (bound on 0.0.0.0).
    /// Env: `PORT`
    /// Default: `3001`
    pub port: u16,

    /// Directory holding the JSON document store (`orders.json`,
    /// `admin.json`).
    /// Env: `DATA_DIR`
    /// Default: `./data`
    pub data_dir: PathBuf,

    /// Directory where uploaded documents are stored.
    /// Env: `UPLOAD_DIR`
    /// Default: `./uploads`
    pub upload_dir: PathBuf,

    /// Admin username seeded into the credential store on first boot.
    /// Env: `ADMIN_USERNAME`
    /// Default: `admin`
    pub admin_username: String,

    /// Admin password seeded into the credential store on first boot.
    /// The default is a publicly known placeholder.
    /// Env: `ADMIN_PASSWORD`
    /// Default: `xerox123`
    pub admin_password: String,

    /// Lifetime of an issued admin session token, in seconds.
    /// Env: `SESSION_TTL_SECS`
    /// Default: `86400` (24 h)
    pub session_ttl_secs: u64,

    /// Maximum size of a single uploaded file in bytes (10 MiB).
    pub max_file_size: usize,

    /// Maximum size of a whole request body in bytes (64 MiB, room for a
    /// batch of maximum-size files).
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            data_dir: PathBuf::from("./data"),
            upload_dir: PathBuf::from("./uploads"),
            admin_username: DEFAULT_USERNAME.to_string(),
            admin_password: DEFAULT_PASSWORD.to_string(),
            session_ttl_secs: 86_400,
            max_file_size: 10 * 1024 * 1024,  // 10 MiB
            max_body_size: 64 * 1024 * 1024,  // 64 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                config.port = parsed;
            } else {
                tracing::warn!(value = %port, "Invalid PORT, using default");
            }
        }

        if let Ok(dir) = std::env::var("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }

        if let Ok(name) = std::env::var("ADMIN_USERNAME") {
            if !name.is_empty() {
                config.admin_username = name;
            }
        }

        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = password;
            }
        }

        if let Ok(ttl) = std::env::var("SESSION_TTL_SECS") {
            if let Ok(parsed) = ttl.parse::<u64>() {
                config.session_ttl_secs = parsed;
            } else {
                tracing::warn!(value = %ttl, "Invalid SESSION_TTL_SECS, using default");
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Socket address the HTTP server binds to.
    pub fn http_addr(&self) -> SocketAddr {
        ([0, 0, 0, 0], self.port).into()
    }
}

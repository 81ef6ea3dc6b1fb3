//! Admin credential singleton.
//!
//! One `{username, password}` record, seeded on first boot and read-only at
//! runtime. There is no rotation operation; changing the credential means
//! editing or deleting the document.

use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;
use crate::models::AdminCredential;
use crate::record_store::RecordStore;

/// Default development credential. Plain text and publicly known; real
/// deployments must override it via configuration.
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "xerox123";

/// Read-mostly store for the admin login singleton.
pub struct CredentialStore {
    store: RecordStore<AdminCredential>,
}

impl CredentialStore {
    /// Open the credential document at `path`, seeding it with `seed` if it
    /// does not exist yet.
    pub async fn open(path: impl Into<PathBuf>, seed: AdminCredential) -> Result<Self> {
        let store = RecordStore::open(path, seed).await?;
        let creds = Self { store };
        // Warn on what actually ended up effective, not on the seed: an
        // existing document wins over whatever the caller passed in.
        if creds.uses_default_password().await {
            warn!("admin credential uses the built-in default password; override it in production");
        }
        Ok(creds)
    }

    /// True when the stored credential still carries the built-in default
    /// password.
    pub async fn uses_default_password(&self) -> bool {
        self.store.snapshot().await.password == DEFAULT_PASSWORD
    }

    /// Exact, case-sensitive match of both username and password.
    pub async fn verify(&self, username: &str, password: &str) -> bool {
        let stored = self.store.snapshot().await;
        stored.username == username && stored.password == password
    }
}

impl Default for AdminCredential {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

//! Admin session tokens.
//!
//! Each successful login is issued an opaque per-session token with an
//! expiry, held in memory. Tokens are not persisted; a restart invalidates
//! all sessions, which is acceptable for a single-admin deployment.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// A live admin session.
#[derive(Debug, Clone)]
struct Session {
    expires_at: DateTime<Utc>,
}

impl Session {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Issues and validates expiring session tokens.
#[derive(Clone)]
pub struct SessionManager {
    ttl: Duration,
    /// token -> session.
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionManager {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issue a fresh token for `username`.
    pub async fn issue(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            expires_at: Utc::now() + self.ttl,
        };

        self.sessions
            .write()
            .await
            .insert(token.clone(), session);

        info!(user = %username, "admin session issued");
        token
    }

    /// Returns `true` if the token belongs to a live, unexpired session.
    pub async fn validate(&self, token: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .map(|session| session.is_fresh())
            .unwrap_or(false)
    }

    /// Evict expired sessions.
    pub async fn purge_expired(&self) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_fresh());
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "purged expired admin sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_validates() {
        let manager = SessionManager::new(60);
        let token = manager.issue("admin").await;

        assert!(manager.validate(&token).await);
    }

    #[tokio::test]
    async fn unknown_token_rejected() {
        let manager = SessionManager::new(60);
        assert!(!manager.validate("not-a-token").await);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_login() {
        let manager = SessionManager::new(60);
        let first = manager.issue("admin").await;
        let second = manager.issue("admin").await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn expired_token_rejected_and_purged() {
        let manager = SessionManager::new(0);
        let token = manager.issue("admin").await;

        assert!(!manager.validate(&token).await);

        manager.purge_expired().await;
        assert!(manager.sessions.read().await.is_empty());
    }
}

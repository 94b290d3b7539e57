//! In-memory snapshot cache for tests and single-server deployments.
//!
//! Entries carry their own expiry instant and are dropped lazily on read.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::foundation::UserId;
use crate::domain::snapshot::UserSnapshot;
use crate::ports::{CacheError, SnapshotCache};

#[derive(Debug, Clone)]
struct Entry {
    snapshot: UserSnapshot,
    expires_at: Instant,
}

/// Process-local snapshot cache.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotCache {
    entries: Arc<RwLock<HashMap<UserId, Entry>>>,
}

impl InMemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live, unexpired entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SnapshotCache for InMemorySnapshotCache {
    async fn get(&self, user: UserId) -> Result<Option<UserSnapshot>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(&user) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.snapshot.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict unless a fresher write landed meanwhile.
        let mut entries = self.entries.write().await;
        if entries.get(&user).is_some_and(|e| e.expires_at <= now) {
            entries.remove(&user);
        }
        Ok(None)
    }

    async fn put(&self, snapshot: &UserSnapshot, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            snapshot: snapshot.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(snapshot.user_id(), entry);
        Ok(())
    }

    async fn remove(&self, user: UserId) -> Result<(), CacheError> {
        self.entries.write().await.remove(&user);
        Ok(())
    }
}

//! Snapshot Cache Port - TTL key-value storage for user snapshots.
//!
//! Concurrent readers are expected. Two requests racing on a miss may both
//! rebuild and both write; the last write wins and both values are valid.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::UserId;
use crate::domain::snapshot::UserSnapshot;

#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Returns the cached snapshot unless missing or expired.
    async fn get(&self, user: UserId) -> Result<Option<UserSnapshot>, CacheError>;

    async fn put(&self, snapshot: &UserSnapshot, ttl: Duration) -> Result<(), CacheError>;

    async fn remove(&self, user: UserId) -> Result<(), CacheError>;
}

/// Cache key for a user's snapshot.
pub fn snapshot_key(user: UserId) -> String {
    format!("user_context:{}", user)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

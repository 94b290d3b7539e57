//! Redis-backed snapshot cache for multi-server deployments.
//!
//! Snapshots are stored as JSON under `{prefix}user_context:{id}` with
//! `SET ... EX`, so expiry is handled by Redis.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

use crate::domain::foundation::UserId;
use crate::domain::snapshot::UserSnapshot;
use crate::ports::{snapshot_key, CacheError, SnapshotCache};

#[derive(Clone)]
pub struct RedisSnapshotCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSnapshotCache {
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, user: UserId) -> String {
        format!("{}{}", self.key_prefix, snapshot_key(user))
    }
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl SnapshotCache for RedisSnapshotCache {
    async fn get(&self, user: UserId) -> Result<Option<UserSnapshot>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.key(user))
            .await
            .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                // Stale shape from an older build; treat as a miss.
                warn!(user_id = %user, error = %e, "Discarding undecodable cached snapshot");
                Ok(None)
            }
        }
    }

    async fn put(&self, snapshot: &UserSnapshot, ttl: Duration) -> Result<(), CacheError> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.key(snapshot.user_id()), raw, ttl_secs(ttl))
            .await
            .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))
    }

    async fn remove(&self, user: UserId) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(user))
            .await
            .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_never_rounds_to_zero() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(900)), 900);
    }
}

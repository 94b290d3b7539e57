//! Snapshot cache adapters.
//!
//! - `InMemorySnapshotCache` - process-local, for tests and single instances
//! - `RedisSnapshotCache` - shared cache with server-side expiry

mod in_memory;
mod redis;

pub use in_memory::InMemorySnapshotCache;
pub use self::redis::RedisSnapshotCache;

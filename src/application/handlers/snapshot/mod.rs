//! User snapshot handlers.

mod snapshot_provider;

pub use snapshot_provider::SnapshotProvider;

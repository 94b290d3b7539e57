//! In-memory adapters for tests and local development.
//!
//! - `InMemorySchoolRecords` - filters rows like the SQL reader and counts calls
//! - `InMemorySnapshotSource` - fixed accounts and role records

mod school_records;
mod snapshot_source;

pub use school_records::InMemorySchoolRecords;
pub use snapshot_source::InMemorySnapshotSource;

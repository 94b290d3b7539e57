//! PostgreSQL adapters - read-only access to the attendance schema.
//!
//! - `PostgresSchoolRecordsReader` - scoped, capped record and class queries
//! - `PostgresSnapshotSource` - account and role records for snapshots

mod rows;
mod school_records_reader;
mod snapshot_source;

pub use school_records_reader::PostgresSchoolRecordsReader;
pub use snapshot_source::PostgresSnapshotSource;

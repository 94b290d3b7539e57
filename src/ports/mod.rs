//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `TextGenerator` - buffered and streamed generation plus health probe
//! - `SchoolRecordsReader` - scoped, capped reads over the attendance schema
//! - `SnapshotSource` - raw material for user snapshots
//! - `SnapshotCache` - TTL storage for built snapshots
//! - `SessionValidator` - bearer token validation

mod school_records;
mod session_validator;
mod snapshot_cache;
mod snapshot_source;
mod text_generator;

pub use school_records::{AttendanceQuery, ExcuseQuery, RecordsError, SchoolRecordsReader};
pub use session_validator::SessionValidator;
pub use snapshot_cache::{snapshot_key, CacheError, SnapshotCache};
pub use snapshot_source::SnapshotSource;
pub use text_generator::{
    BackendHealth, Fragment, FragmentStream, GenerationError, GenerationRequest, TextGenerator,
};

//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod assistant;
pub mod snapshot;

pub use assistant::{
    AssistantError, AssistantSettings, Fallback, FormatGuard, QueryRequestCommand,
    QueryRequestHandler, QueryRequestResult, RetrievalOutcome, RetrievalPlanner, StatusHandler,
    StreamChatCommand, StreamChatHandler,
};
pub use snapshot::SnapshotProvider;

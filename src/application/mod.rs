//! Application layer - handlers that sequence the domain stages over ports.

pub mod handlers;

pub use handlers::{
    AssistantError, AssistantSettings, Fallback, QueryRequestCommand, QueryRequestHandler,
    QueryRequestResult, SnapshotProvider, StatusHandler, StreamChatCommand, StreamChatHandler,
};

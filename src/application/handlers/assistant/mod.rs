//! Assistant handlers - the question pipeline's orchestration.
//!
//! - `RetrievalPlanner` - scoped, capped retrieval for a question
//! - `FormatGuard` - single rewrite of data-looking replies
//! - `QueryRequestHandler` - buffered replies
//! - `StreamChatHandler` - incremental replies
//! - `StatusHandler` - backend health

mod format_guard;
mod query_request;
mod retrieval_planner;
mod settings;
mod status;
mod stream_chat;

pub use format_guard::{FormatGuard, GuardedReply};
pub use query_request::{Fallback, QueryRequestCommand, QueryRequestHandler, QueryRequestResult};
pub use retrieval_planner::{RetrievalOutcome, RetrievalPlanner};
pub use settings::{
    unsupported_reply, AssistantError, AssistantSettings, GENERATION_FALLBACK, RETRIEVAL_FALLBACK,
};
pub use status::StatusHandler;
pub use stream_chat::{StreamChatCommand, StreamChatHandler};

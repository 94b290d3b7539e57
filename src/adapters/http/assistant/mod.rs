//! HTTP adapter for the assistant endpoints.

mod dto;
mod handlers;
mod routes;
mod streaming;

pub use dto::{
    ErrorResponse, HealthResponse, HistoryItem, QueryRequest, QueryResponse, RefreshResponse,
    StatusResponse, StreamRequest,
};
pub use handlers::{AssistantApiError, AssistantAppState};
pub use routes::assistant_router;
pub use streaming::{fragment_response, DEADLINE_MESSAGE};

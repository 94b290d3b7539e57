//! HTTP adapters - REST and SSE endpoints.

pub mod assistant;
pub mod middleware;

pub use assistant::{assistant_router, AssistantAppState};
pub use middleware::{auth_middleware, AuthState, RequireAuth};

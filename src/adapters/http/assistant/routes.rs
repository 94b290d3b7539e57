//! HTTP routes for the assistant endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{health, query, refresh_context, status, stream, AssistantAppState};

/// Creates the assistant router.
///
/// Everything under `/api/chatbot` requires a bearer token; `/health` does not.
pub fn assistant_router(state: AssistantAppState, auth: AuthState) -> Router {
    let chatbot = Router::new()
        .route("/query", post(query))
        .route("/stream", post(stream))
        .route("/status", get(status))
        .route("/context/refresh", post(refresh_context))
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/chatbot", chatbot)
        .route("/health", get(health))
}

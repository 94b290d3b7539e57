//! HTTP handlers for the assistant endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::assistant::{
    AssistantError, AssistantSettings, QueryRequestCommand, QueryRequestHandler, RetrievalPlanner,
    StatusHandler, StreamChatCommand, StreamChatHandler,
};
use crate::application::handlers::snapshot::SnapshotProvider;
use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::domain::snapshot::SnapshotError;
use crate::ports::TextGenerator;

use super::dto::{
    to_chat_turns, ErrorResponse, HealthResponse, QueryRequest, QueryResponse, RefreshResponse,
    StatusResponse, StreamRequest,
};
use super::streaming::fragment_response;

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AssistantAppState {
    query: Arc<QueryRequestHandler>,
    stream: Arc<StreamChatHandler>,
    status: Arc<StatusHandler>,
    snapshots: Arc<SnapshotProvider>,
    stream_deadline: Duration,
    expose_debug: bool,
}

impl AssistantAppState {
    /// Wires the handlers over one snapshot provider, planner and generator.
    pub fn new(
        snapshots: Arc<SnapshotProvider>,
        planner: Arc<RetrievalPlanner>,
        generator: Arc<dyn TextGenerator>,
        settings: AssistantSettings,
        stream_deadline: Duration,
    ) -> Self {
        let expose_debug = settings.expose_debug;
        Self {
            query: Arc::new(QueryRequestHandler::new(
                snapshots.clone(),
                planner.clone(),
                generator.clone(),
                settings.clone(),
            )),
            stream: Arc::new(StreamChatHandler::new(
                snapshots.clone(),
                planner,
                generator.clone(),
                settings,
            )),
            status: Arc::new(StatusHandler::new(generator)),
            snapshots,
            stream_deadline,
            expose_debug,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/chatbot/query - Buffered reply
pub async fn query(
    State(state): State<AssistantAppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return AssistantApiError::BadBody(rejection.body_text()).into_response(),
    };

    let cmd = QueryRequestCommand {
        user_id: user.id,
        message: req.message,
        history: to_chat_turns(req.history),
    };

    match state.query.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(QueryResponse::from(result))).into_response(),
        Err(e) => AssistantApiError::from_assistant(e, state.expose_debug).into_response(),
    }
}

/// POST /api/chatbot/stream - Incremental reply as server-sent events
pub async fn stream(
    State(state): State<AssistantAppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<StreamRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return AssistantApiError::BadBody(rejection.body_text()).into_response(),
    };

    let cmd = StreamChatCommand {
        user_id: user.id,
        query: req.query,
        history: to_chat_turns(req.history),
    };

    match state.stream.handle(cmd).await {
        Ok(fragments) => fragment_response(fragments, state.stream_deadline),
        Err(e) => AssistantApiError::from_assistant(e, state.expose_debug).into_response(),
    }
}

/// GET /api/chatbot/status - Generation backend health
pub async fn status(
    State(state): State<AssistantAppState>,
    RequireAuth(_user): RequireAuth,
) -> Response {
    let health = state.status.handle().await;
    let code = if health.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(StatusResponse { ai: health })).into_response()
}

/// POST /api/chatbot/context/refresh - Rebuild the caller's snapshot
pub async fn refresh_context(
    State(state): State<AssistantAppState>,
    RequireAuth(user): RequireAuth,
) -> Response {
    match state.snapshots.force_rebuild(user.id).await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(RefreshResponse {
                refreshed: true,
                role: snapshot.role(),
            }),
        )
            .into_response(),
        Err(e) => {
            AssistantApiError::from_assistant(AssistantError::Snapshot(e), state.expose_debug)
                .into_response()
        }
    }
}

/// GET /health - Liveness
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

/// Errors surfaced by the assistant endpoints.
#[derive(Debug)]
pub enum AssistantApiError {
    Validation(ValidationError),
    /// Body missing, not JSON, or missing fields.
    BadBody(String),
    AccountNotFound,
    AccessDenied,
    StreamingDisabled,
    Internal { debug: Option<String> },
}

impl AssistantApiError {
    pub fn from_assistant(error: AssistantError, expose_debug: bool) -> Self {
        match error {
            AssistantError::Validation(e) => AssistantApiError::Validation(e),
            AssistantError::StreamingDisabled => AssistantApiError::StreamingDisabled,
            AssistantError::Snapshot(SnapshotError::UserNotFound(_)) => {
                AssistantApiError::AccountNotFound
            }
            AssistantError::Snapshot(SnapshotError::AccessDenied { .. }) => {
                AssistantApiError::AccessDenied
            }
            AssistantError::Snapshot(e @ SnapshotError::Source(_)) => {
                error!(error = %e, "Snapshot build failed");
                AssistantApiError::Internal {
                    debug: expose_debug.then(|| e.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for AssistantApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AssistantApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::validation(e.to_string()).with_details(json!({ "field": e.field() })),
            ),
            AssistantApiError::BadBody(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::validation(message),
            ),
            AssistantApiError::AccountNotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse::not_found("Account not found"),
            ),
            AssistantApiError::AccessDenied => (
                StatusCode::FORBIDDEN,
                ErrorResponse::forbidden("Your account has no student or teacher record"),
            ),
            AssistantApiError::StreamingDisabled => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ErrorCode::FeatureDisabled, "Streaming is disabled"),
            ),
            AssistantApiError::Internal { debug } => {
                let body = ErrorResponse::internal("An unexpected error occurred. Please try again.");
                let body = match debug {
                    Some(detail) => body.with_details(json!({ "debug": detail })),
                    None => body,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

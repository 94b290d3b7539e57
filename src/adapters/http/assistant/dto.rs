//! HTTP DTOs for the assistant endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::assistant::{Fallback, QueryRequestResult};
use crate::domain::assistant::{ChatTurn, Intent, RetrievalPlan, Speaker};
use crate::domain::foundation::{ErrorCode, Role};
use crate::ports::BackendHealth;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// POST /query body.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub message: String,
    #[serde(default, alias = "conversation_history")]
    pub history: Vec<HistoryItem>,
}

/// POST /stream body.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRequest {
    pub query: String,
    #[serde(default, alias = "conversation_history")]
    pub history: Vec<HistoryItem>,
}

/// One prior message as the chat widget sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryItem {
    pub role: String,
    pub content: String,
}

/// Keeps user and assistant turns; anything else is dropped.
pub fn to_chat_turns(items: Vec<HistoryItem>) -> Vec<ChatTurn> {
    items
        .into_iter()
        .filter_map(|item| {
            let speaker = match item.role.trim().to_ascii_lowercase().as_str() {
                "user" => Speaker::User,
                "assistant" | "bot" => Speaker::Assistant,
                _ => return None,
            };
            Some(ChatTurn {
                speaker,
                content: item.content,
            })
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub reply: String,
    /// Plan that produced the data behind the reply.
    pub retrieval: RetrievalPlan,
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl From<QueryRequestResult> for QueryResponse {
    fn from(result: QueryRequestResult) -> Self {
        Self {
            intent: result.intent(),
            reply: result.reply,
            retrieval: result.retrieval.plan,
            fallback: result.fallback,
            debug: result.debug,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub ai: BackendHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

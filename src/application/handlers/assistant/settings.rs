//! Pipeline tuning shared by the assistant handlers, plus the fixed replies.

use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::domain::assistant::{ChatTurn, ComposeOptions, CAPABILITIES};
use crate::domain::foundation::ValidationError;
use crate::domain::snapshot::SnapshotError;

/// Reply when retrieval failed.
pub const RETRIEVAL_FALLBACK: &str = "I'm sorry, I couldn't retrieve the information you requested. \
     Please try rephrasing your question or try again later.";

/// Reply when generation failed or came back empty.
pub const GENERATION_FALLBACK: &str =
    "I'm having trouble generating a response right now. Please try again.";

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub compose: ComposeOptions,
    /// Most recent turns forwarded to the prompt.
    pub history_window: usize,
    pub max_message_chars: usize,
    /// Attach error detail to fallback replies.
    pub expose_debug: bool,
    pub format_guard: bool,
    pub streaming: bool,
    /// Time allowed for generation and rewrite on a buffered query.
    pub reply_deadline: Duration,
}

impl AssistantSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            compose: ComposeOptions {
                max_list_items: config.assistant.max_list_items,
                truncate_chars: config.assistant.truncate_chars,
            },
            history_window: config.assistant.history_window,
            max_message_chars: config.assistant.max_message_chars,
            expose_debug: !config.server.is_production(),
            format_guard: config.features.enable_format_guard,
            streaming: config.features.enable_streaming,
            reply_deadline: config.assistant.reply_deadline(),
        }
    }

    /// The last `history_window` turns of `history`.
    pub(super) fn recent<'a>(&self, history: &'a [ChatTurn]) -> &'a [ChatTurn] {
        let skip = history.len().saturating_sub(self.history_window);
        &history[skip..]
    }

    pub(super) fn debug_detail(&self, detail: impl ToString) -> Option<String> {
        self.expose_debug.then(|| detail.to_string())
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            compose: ComposeOptions::default(),
            history_window: 6,
            max_message_chars: 2_000,
            expose_debug: false,
            format_guard: true,
            streaming: true,
            reply_deadline: Duration::from_secs(80),
        }
    }
}

/// Fixed reply for questions no intent matched.
pub fn unsupported_reply() -> String {
    let mut reply = String::from(
        "I'm not sure how to help with that yet. Here's what I can answer for you:\n",
    );
    for capability in CAPABILITIES {
        reply.push_str("- ");
        reply.push_str(capability);
        reply.push('\n');
    }
    reply.trim_end().to_string()
}

/// Failures that stop a request before any reply is produced.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Streaming is disabled")]
    StreamingDisabled,
}

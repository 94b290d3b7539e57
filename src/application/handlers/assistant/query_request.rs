//! QueryRequestHandler - buffered question answering.
//!
//! snapshot -> retrieval -> prompt -> generation -> format guard.
//! Retrieval and generation failures become friendly fallback replies; only
//! validation and snapshot failures reach the caller as errors. Generation
//! and rewrite share one reply deadline.

use serde::Serialize;
use std::sync::Arc;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use super::format_guard::{FormatGuard, GuardedReply};
use super::retrieval_planner::{RetrievalOutcome, RetrievalPlanner};
use super::settings::{
    unsupported_reply, AssistantError, AssistantSettings, GENERATION_FALLBACK, RETRIEVAL_FALLBACK,
};
use crate::application::handlers::snapshot::SnapshotProvider;
use crate::domain::assistant::{compose, ChatTurn, Intent, Question, RetrievalResult};
use crate::domain::foundation::UserId;
use crate::ports::{GenerationRequest, TextGenerator};

/// Command to answer one question.
#[derive(Debug, Clone)]
pub struct QueryRequestCommand {
    pub user_id: UserId,
    pub message: String,
    pub history: Vec<ChatTurn>,
}

/// Why a fixed reply was used instead of a generated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    Unsupported,
    Retrieval,
    Generation,
}

#[derive(Debug, Clone)]
pub struct QueryRequestResult {
    pub reply: String,
    pub retrieval: RetrievalOutcome,
    pub fallback: Option<Fallback>,
    /// Whether the format guard replaced the generated text.
    pub rewritten: bool,
    pub debug: Option<String>,
}

impl QueryRequestResult {
    pub fn intent(&self) -> Intent {
        self.retrieval.intent
    }
}

pub struct QueryRequestHandler {
    snapshots: Arc<SnapshotProvider>,
    planner: Arc<RetrievalPlanner>,
    generator: Arc<dyn TextGenerator>,
    guard: FormatGuard,
    settings: AssistantSettings,
}

impl QueryRequestHandler {
    pub fn new(
        snapshots: Arc<SnapshotProvider>,
        planner: Arc<RetrievalPlanner>,
        generator: Arc<dyn TextGenerator>,
        settings: AssistantSettings,
    ) -> Self {
        let guard = FormatGuard::new(generator.clone()).with_enabled(settings.format_guard);
        Self {
            snapshots,
            planner,
            generator,
            guard,
            settings,
        }
    }

    pub async fn handle(&self, cmd: QueryRequestCommand) -> Result<QueryRequestResult, AssistantError> {
        let question = Question::parse(&cmd.message, self.settings.max_message_chars)?;
        let snapshot = self.snapshots.get(cmd.user_id).await?;

        let retrieval = self
            .planner
            .plan_and_execute(question.as_str(), &snapshot)
            .await;
        let intent = retrieval.intent;

        info!(
            user_id = %cmd.user_id,
            intent = %intent,
            rows = retrieval.result.row_count(),
            "Query planned"
        );

        if intent == Intent::Unknown {
            return Ok(self.fixed(unsupported_reply(), retrieval, Fallback::Unsupported, None));
        }

        if let RetrievalResult::Error { error } = &retrieval.result {
            let debug = self.settings.debug_detail(error);
            return Ok(self.fixed(RETRIEVAL_FALLBACK.to_string(), retrieval, Fallback::Retrieval, debug));
        }

        let prompt = compose(
            &snapshot,
            intent,
            &retrieval.result,
            question.as_str(),
            self.settings.recent(&cmd.history),
            &self.settings.compose,
        );
        if prompt.truncated {
            warn!(user_id = %cmd.user_id, chars = prompt.char_len(), "Prompt truncated to budget");
        }

        let deadline = Instant::now() + self.settings.reply_deadline;
        let generation = timeout(
            self.settings.reply_deadline,
            self.generator.generate(GenerationRequest::new(prompt.text)),
        )
        .await;

        let draft = match generation {
            Err(_) => {
                warn!(
                    user_id = %cmd.user_id,
                    intent = %intent,
                    deadline_secs = self.settings.reply_deadline.as_secs(),
                    "Generation exceeded reply deadline"
                );
                return Ok(self.fixed(
                    GENERATION_FALLBACK.to_string(),
                    retrieval,
                    Fallback::Generation,
                    self.settings.debug_detail("generation deadline exceeded"),
                ));
            }
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                warn!(user_id = %cmd.user_id, intent = %intent, "Generation returned empty text");
                return Ok(self.fixed(
                    GENERATION_FALLBACK.to_string(),
                    retrieval,
                    Fallback::Generation,
                    self.settings.debug_detail("empty generation"),
                ));
            }
            Ok(Err(e)) => {
                warn!(user_id = %cmd.user_id, intent = %intent, error = %e, "Generation failed");
                return Ok(self.fixed(
                    GENERATION_FALLBACK.to_string(),
                    retrieval,
                    Fallback::Generation,
                    self.settings.debug_detail(&e),
                ));
            }
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let guarded = match timeout(remaining, self.guard.apply(question.as_str(), draft.clone())).await {
            Ok(guarded) => guarded,
            Err(_) => {
                warn!(user_id = %cmd.user_id, "Rewrite exceeded reply deadline, keeping draft");
                GuardedReply {
                    text: draft,
                    rewritten: false,
                }
            }
        };

        Ok(QueryRequestResult {
            reply: guarded.text,
            retrieval,
            fallback: None,
            rewritten: guarded.rewritten,
            debug: None,
        })
    }

    fn fixed(
        &self,
        reply: String,
        retrieval: RetrievalOutcome,
        fallback: Fallback,
        debug: Option<String>,
    ) -> QueryRequestResult {
        QueryRequestResult {
            reply,
            retrieval,
            fallback: Some(fallback),
            rewritten: false,
            debug,
        }
    }
}

#[cfg(test)]
#[path = "query_request_test.rs"]
mod tests;

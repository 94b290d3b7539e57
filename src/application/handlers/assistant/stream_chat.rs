//! StreamChatHandler - incremental replies.
//!
//! Planning and prompt composition happen before the stream is returned.
//! The stream itself is the generator's, unretried; fixed replies are a
//! single text fragment. The format guard does not apply here since the
//! fragments are already on the wire.

use futures::stream;
use std::sync::Arc;
use tracing::info;

use super::retrieval_planner::RetrievalPlanner;
use super::settings::{unsupported_reply, AssistantError, AssistantSettings, RETRIEVAL_FALLBACK};
use crate::application::handlers::snapshot::SnapshotProvider;
use crate::domain::assistant::{compose, ChatTurn, Intent, Question};
use crate::domain::foundation::UserId;
use crate::ports::{Fragment, FragmentStream, GenerationRequest, TextGenerator};

#[derive(Debug, Clone)]
pub struct StreamChatCommand {
    pub user_id: UserId,
    pub query: String,
    pub history: Vec<ChatTurn>,
}

pub struct StreamChatHandler {
    snapshots: Arc<SnapshotProvider>,
    planner: Arc<RetrievalPlanner>,
    generator: Arc<dyn TextGenerator>,
    settings: AssistantSettings,
}

impl StreamChatHandler {
    pub fn new(
        snapshots: Arc<SnapshotProvider>,
        planner: Arc<RetrievalPlanner>,
        generator: Arc<dyn TextGenerator>,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            snapshots,
            planner,
            generator,
            settings,
        }
    }

    pub async fn handle(&self, cmd: StreamChatCommand) -> Result<FragmentStream, AssistantError> {
        if !self.settings.streaming {
            return Err(AssistantError::StreamingDisabled);
        }

        let question = Question::parse(&cmd.query, self.settings.max_message_chars)?;
        let snapshot = self.snapshots.get(cmd.user_id).await?;

        let retrieval = self
            .planner
            .plan_and_execute(question.as_str(), &snapshot)
            .await;
        let intent = retrieval.intent;

        info!(user_id = %cmd.user_id, intent = %intent, "Streaming reply");

        if intent == Intent::Unknown {
            return Ok(single(unsupported_reply()));
        }
        if retrieval.result.is_error() {
            return Ok(single(RETRIEVAL_FALLBACK.to_string()));
        }

        let prompt = compose(
            &snapshot,
            intent,
            &retrieval.result,
            question.as_str(),
            self.settings.recent(&cmd.history),
            &self.settings.compose,
        );

        Ok(self
            .generator
            .stream_generate(GenerationRequest::new(prompt.text)))
    }
}

fn single(text: String) -> FragmentStream {
    Box::pin(stream::once(async move { Fragment::Text(text) }))
}

//! Assistant pipeline tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Smallest prompt budget that still fits the fixed instruction block.
pub const MIN_PROMPT_BUDGET: usize = 1_500;

/// Assistant pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Items kept from any list embedded in a prompt
    #[serde(default = "default_max_list_items")]
    pub max_list_items: usize,

    /// Prompt budget in characters
    #[serde(default = "default_truncate_chars")]
    pub truncate_chars: usize,

    /// Recent messages carried into the prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Maximum accepted question length in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Snapshot cache TTL in seconds
    #[serde(default = "default_snapshot_ttl")]
    pub snapshot_ttl_secs: u64,

    /// Budget for generation plus rewrite on buffered queries, in seconds.
    /// Must stay below `server.request_timeout_secs`.
    #[serde(default = "default_reply_deadline")]
    pub reply_deadline_secs: u64,
}

impl AssistantConfig {
    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }

    pub fn reply_deadline(&self) -> Duration {
        Duration::from_secs(self.reply_deadline_secs)
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.truncate_chars < MIN_PROMPT_BUDGET {
            return Err(ValidationError::PromptBudgetTooSmall {
                min: MIN_PROMPT_BUDGET,
            });
        }
        if self.max_message_chars == 0 {
            return Err(ValidationError::MissingRequired("ASSISTANT__MAX_MESSAGE_CHARS"));
        }
        if self.snapshot_ttl_secs == 0 || self.reply_deadline_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_list_items: default_max_list_items(),
            truncate_chars: default_truncate_chars(),
            history_window: default_history_window(),
            max_message_chars: default_max_message_chars(),
            snapshot_ttl_secs: default_snapshot_ttl(),
            reply_deadline_secs: default_reply_deadline(),
        }
    }
}

fn default_max_list_items() -> usize {
    10
}

fn default_truncate_chars() -> usize {
    4_000
}

fn default_history_window() -> usize {
    6
}

fn default_max_message_chars() -> usize {
    2_000
}

fn default_snapshot_ttl() -> u64 {
    900
}

fn default_reply_deadline() -> u64 {
    80
}

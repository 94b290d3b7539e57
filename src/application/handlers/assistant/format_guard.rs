//! FormatGuard - rewrites replies that read like raw data.
//!
//! At most one rewrite call is made per reply. Any failure along the way
//! leaves the original draft in place.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::assistant::{
    humanize_structured, is_technical_looking, parse_structured, rewrite_prompt,
};
use crate::ports::{GenerationRequest, TextGenerator};

/// Final text after the guard ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedReply {
    pub text: String,
    pub rewritten: bool,
}

impl GuardedReply {
    fn unchanged(text: String) -> Self {
        Self {
            text,
            rewritten: false,
        }
    }
}

pub struct FormatGuard {
    generator: Arc<dyn TextGenerator>,
    enabled: bool,
}

impl FormatGuard {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks `draft` and rewrites it once if it looks technical.
    pub async fn apply(&self, question: &str, draft: String) -> GuardedReply {
        if !self.enabled || !is_technical_looking(&draft) {
            return GuardedReply::unchanged(draft);
        }

        debug!(chars = draft.len(), "Reply looks technical, requesting rewrite");
        let request = GenerationRequest::new(rewrite_prompt(question, &draft));

        let rewrite = match self.generator.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Rewrite failed, keeping original reply");
                return GuardedReply::unchanged(draft);
            }
        };

        let rewrite = rewrite.trim();
        if rewrite.is_empty() {
            warn!("Rewrite came back empty, keeping original reply");
            return GuardedReply::unchanged(draft);
        }

        // A rewrite that is itself JSON gets flattened locally.
        let text = match parse_structured(rewrite) {
            Some(value) => match humanize_structured(&value) {
                Some(prose) => prose,
                None => return GuardedReply::unchanged(draft),
            },
            None => rewrite.to_string(),
        };

        GuardedReply {
            text,
            rewritten: true,
        }
    }
}

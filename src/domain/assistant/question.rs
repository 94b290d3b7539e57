//! Validated user question.

use std::fmt;

use crate::domain::foundation::ValidationError;

/// A trimmed, non-empty question within the length limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Trims `raw` and checks it is non-empty and at most `max_chars` long.
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("message"));
        }
        let len = trimmed.chars().count();
        if len > max_chars {
            return Err(ValidationError::too_long("message", max_chars, len));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Account roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an account acts under when talking to the assistant.
///
/// Drives both data scoping and the tone of generated replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    Unknown,
}

impl Role {
    /// Maps the free-form `users.role` column onto a role.
    pub fn from_column(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("student") => Role::Student,
            Some("teacher") | Some("faculty") => Role::Teacher,
            Some("admin") | Some("administrator") => Role::Admin,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

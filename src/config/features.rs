//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Expose the incremental `/stream` route
    #[serde(default = "enabled")]
    pub enable_streaming: bool,

    /// Run replies through the technical-output rewrite pass
    #[serde(default = "enabled")]
    pub enable_format_guard: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_streaming: enabled(),
            enable_format_guard: enabled(),
        }
    }
}

fn enabled() -> bool {
    true
}

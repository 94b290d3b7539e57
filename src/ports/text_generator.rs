//! Text Generator Port - Interface for the text-generation backend.
//!
//! The assistant needs three things from a backend: a buffered completion,
//! an incremental stream of fragments, and a cheap reachability check.
//!
//! # Failure shape
//!
//! - `generate` returns `Err` for every failure, after whatever retries the
//!   adapter applies. Callers substitute their own fallback text.
//! - `stream_generate` never fails up front. An unreachable backend or a
//!   broken stream shows up as a single terminal [`Fragment::Error`].

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

/// Fragments of a streamed reply, in backend emission order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Fragment> + Send>>;

/// Port for text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a complete reply (buffered).
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;

    /// Generate a reply incrementally.
    ///
    /// The stream is lazy: no connection is opened until it is first polled.
    /// Dropping it cancels the upstream call.
    fn stream_generate(&self, request: GenerationRequest) -> FragmentStream;

    /// Reachability only; never runs a generation.
    async fn health_check(&self) -> BackendHealth;
}

/// Request for text generation.
///
/// Unset sampling fields fall back to the adapter's configured defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop_sequences: Vec<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop_sequences: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }
}

/// One piece of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// Terminal; nothing follows it.
    Error(String),
}

impl Fragment {
    pub fn error(message: impl Into<String>) -> Self {
        Fragment::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Fragment::Error(_))
    }
}

/// Result of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendHealth {
    pub ok: bool,
    pub base_url: String,
    pub model: String,
}

/// Text generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The reachability probe failed; nothing was sent.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// Could not connect or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body could not be decoded into any text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl GenerationError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Connection failures, timeouts, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Network(_) | GenerationError::Timeout { .. } => true,
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Unreachable(_)
            | GenerationError::Parse(_)
            | GenerationError::Exhausted { .. } => false,
        }
    }
}

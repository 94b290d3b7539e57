//! Mock Text Generator for testing.
//!
//! Provides a configurable implementation of the TextGenerator port so the
//! assistant pipeline can run without a live backend.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockTextGenerator::new()
//!     .with_response("Your attendance rate is 92%.")
//!     .with_delay(Duration::from_millis(50));
//!
//! let reply = generator.generate(GenerationRequest::new(prompt)).await?;
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    BackendHealth, Fragment, FragmentStream, GenerationError, GenerationRequest, TextGenerator,
};

/// Configurable mock generator.
///
/// Responses are consumed in order by both `generate` and `stream_generate`.
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    responses: Arc<Mutex<VecDeque<MockReply>>>,
    delay: Duration,
    healthy: bool,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

/// A configured mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Success(String),
    Error(MockError),
}

/// Mock error types for exercising failure paths.
#[derive(Debug, Clone)]
pub enum MockError {
    Unreachable,
    Timeout { timeout_secs: u64 },
    Status { status: u16 },
    Exhausted { attempts: u32 },
}

impl From<MockError> for GenerationError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::Unreachable => GenerationError::Unreachable("mock backend down".into()),
            MockError::Timeout { timeout_secs } => GenerationError::Timeout { timeout_secs },
            MockError::Status { status } => GenerationError::status(status, "mock failure"),
            MockError::Exhausted { attempts } => GenerationError::Exhausted {
                attempts,
                last_error: "mock failure".into(),
            },
        }
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            healthy: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful reply to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockReply::Success(content.into()));
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockReply::Error(error));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Marks the backend unreachable for health checks and streams.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, reply: MockReply) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(reply);
        }
    }

    fn record(&self, request: GenerationRequest) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
    }

    fn next_reply(&self) -> MockReply {
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| MockReply::Success("Mock response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.record(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Success(content) => Ok(content),
            MockReply::Error(err) => Err(err.into()),
        }
    }

    fn stream_generate(&self, request: GenerationRequest) -> FragmentStream {
        self.record(request);

        if !self.healthy {
            return Box::pin(stream::once(async {
                Fragment::error("AI service unreachable")
            }));
        }

        let delay = self.delay;
        match self.next_reply() {
            MockReply::Success(content) => {
                // Split on word boundaries, keeping the separators.
                let pieces: Vec<Fragment> = content
                    .split_inclusive(' ')
                    .map(|s| Fragment::Text(s.to_string()))
                    .collect();

                Box::pin(stream::iter(pieces).then(move |fragment| async move {
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    fragment
                }))
            }
            MockReply::Error(err) => {
                let message = GenerationError::from(err).to_string();
                Box::pin(stream::once(async move { Fragment::Error(message) }))
            }
        }
    }

    async fn health_check(&self) -> BackendHealth {
        BackendHealth {
            ok: self.healthy,
            base_url: "mock://generator".to_string(),
            model: "mock-model".to_string(),
        }
    }
}

//! Ollama Client - Implementation of TextGenerator for an Ollama-compatible backend.
//!
//! # Endpoints
//!
//! - `GET {base}/` is the reachability probe.
//! - `POST {base}/api/generate` runs a generation, buffered (`stream: false`)
//!   or as newline-delimited JSON (`stream: true`).
//!
//! # Configuration
//!
//! ```ignore
//! let config = OllamaConfig::from(&app_config.generation)
//!     .with_base_url("http://gpu-box:11434");
//!
//! let client = OllamaClient::new(config)?;
//! ```
//!
//! Three HTTP clients are kept, one per timeout profile: a short one for the
//! probe, one for buffered calls and a long one for streams.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, Response};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::ndjson::{decode_buffered, GenerateChunk, NdjsonDecoder};
use crate::config::GenerationConfig;
use crate::ports::{
    BackendHealth, Fragment, FragmentStream, GenerationError, GenerationRequest, TextGenerator,
};

/// Fragment text emitted when the probe fails before a stream starts.
pub const UNREACHABLE_MESSAGE: &str = "AI service unreachable";

/// Configuration for the Ollama client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
    pub probe_connect_timeout: Duration,
    pub probe_timeout: Duration,
    pub connect_timeout: Duration,
    pub generate_timeout: Duration,
    pub stream_timeout: Duration,
    /// Attempts for the buffered path, including the first.
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff[n - 1]`; the last entry repeats.
    pub backoff: Vec<Duration>,
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            model: model.into(),
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 256,
            stop_sequences: Vec::new(),
            probe_connect_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(5),
            generate_timeout: Duration::from_secs(55),
            stream_timeout: Duration::from_secs(115),
            max_attempts: 3,
            backoff: vec![
                Duration::from_millis(200),
                Duration::from_millis(500),
                Duration::from_millis(1000),
            ],
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = trim_base(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    fn delay_before_retry(&self, failed_attempt: u32) -> Duration {
        let index = failed_attempt.saturating_sub(1) as usize;
        self.backoff
            .get(index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or_default()
    }
}

impl From<&GenerationConfig> for OllamaConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            base_url: trim_base(config.base_url.clone()),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            stop_sequences: config.stop_sequences_list(),
            probe_connect_timeout: config.probe_connect_timeout(),
            probe_timeout: config.probe_timeout(),
            connect_timeout: config.connect_timeout(),
            generate_timeout: config.generate_timeout(),
            stream_timeout: config.stream_timeout(),
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff_schedule(),
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Ollama backend client.
#[derive(Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    probe_client: Client,
    generate_client: Client,
    stream_client: Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, GenerationError> {
        let build = |connect: Duration, total: Duration| {
            Client::builder()
                .connect_timeout(connect)
                .timeout(total)
                .build()
                .map_err(|e| GenerationError::network(format!("failed to build HTTP client: {e}")))
        };

        Ok(Self {
            probe_client: build(config.probe_connect_timeout, config.probe_timeout)?,
            generate_client: build(config.connect_timeout, config.generate_timeout)?,
            stream_client: build(config.connect_timeout, config.stream_timeout)?,
            config,
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }

    fn to_ollama_request(&self, request: &GenerationRequest, stream: bool) -> OllamaRequest {
        let stop = if request.stop_sequences.is_empty() {
            self.config.stop_sequences.clone()
        } else {
            request.stop_sequences.clone()
        };

        OllamaRequest {
            model: self.config.model.clone(),
            prompt: request.prompt.clone(),
            stream,
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                top_p: request.top_p.unwrap_or(self.config.top_p),
                num_predict: request.max_tokens.unwrap_or(self.config.max_tokens),
                stop,
            },
        }
    }

    /// Sends one buffered generation and decodes the body.
    async fn send_once(&self, body: &OllamaRequest) -> Result<String, GenerationError> {
        let response = self
            .generate_client
            .post(self.generate_url())
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.generate_timeout))?;

        let response = check_status(response).await?;
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, self.config.generate_timeout))?;

        decode_buffered(&text)
    }
}

/// Issues `GET {base}/` and reports whether it answered with success.
async fn probe(client: &Client, base_url: &str) -> Result<(), String> {
    let response = client
        .get(format!("{}/", base_url))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("probe returned {}", response.status()))
    }
}

fn map_transport_error(e: reqwest::Error, timeout: Duration) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else if e.is_connect() {
        GenerationError::network(format!("Connection failed: {}", e))
    } else {
        GenerationError::network(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenerationError::status(status.as_u16(), body))
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        if let Err(reason) = probe(&self.probe_client, &self.config.base_url).await {
            warn!(base_url = %self.config.base_url, reason = %reason, "Generation backend unreachable");
            return Err(GenerationError::Unreachable(reason));
        }

        let body = self.to_ollama_request(&request, false);
        let attempts = self.config.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.send_once(&body).await {
                Ok(text) => {
                    debug!(attempt, reply_chars = text.chars().count(), "Generation succeeded");
                    return Ok(text);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(attempt, error = %e, "Generation failed with non-retryable error");
                    return Err(e);
                }
                Err(e) if attempt >= attempts => {
                    warn!(attempts, error = %e, "Generation attempts exhausted");
                    return Err(GenerationError::Exhausted {
                        attempts,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.config.delay_before_retry(attempt);
                    info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Generation attempt failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn stream_generate(&self, request: GenerationRequest) -> FragmentStream {
        let body = self.to_ollama_request(&request, true);
        let probe_client = self.probe_client.clone();
        let stream_client = self.stream_client.clone();
        let base_url = self.config.base_url.clone();
        let url = self.generate_url();
        let timeout = self.config.stream_timeout;

        let opened = stream::once(async move {
            if let Err(reason) = probe(&probe_client, &base_url).await {
                warn!(base_url = %base_url, reason = %reason, "Generation backend unreachable");
                return Err(UNREACHABLE_MESSAGE.to_string());
            }

            let response = stream_client
                .post(url)
                .json(&body)
                .send()
                .await
                .map_err(|e| map_transport_error(e, timeout).to_string())?;

            check_status(response).await.map_err(|e| e.to_string())
        });

        Box::pin(opened.flat_map(|opened| match opened {
            Ok(response) => fragments_from_body(Box::pin(response.bytes_stream())).boxed(),
            Err(message) => stream::once(async move { Fragment::Error(message) }).boxed(),
        }))
    }

    async fn health_check(&self) -> BackendHealth {
        let result = probe(&self.probe_client, &self.config.base_url).await;
        if let Err(ref reason) = result {
            debug!(reason = %reason, "Health probe failed");
        }
        BackendHealth {
            ok: result.is_ok(),
            base_url: self.config.base_url.clone(),
            model: self.config.model.clone(),
        }
    }
}

struct BodyState<S> {
    body: S,
    decoder: NdjsonDecoder,
    queue: VecDeque<Fragment>,
    finished: bool,
}

impl<S> BodyState<S> {
    fn enqueue(&mut self, chunks: impl IntoIterator<Item = GenerateChunk>) {
        for chunk in chunks {
            if self.finished {
                return;
            }
            if let Some(message) = chunk.error {
                self.queue.push_back(Fragment::Error(message));
                self.finished = true;
                return;
            }
            if !chunk.response.is_empty() {
                self.queue.push_back(Fragment::Text(chunk.response));
            }
            if chunk.done {
                self.finished = true;
            }
        }
    }
}

/// Turns a raw NDJSON byte stream into fragments.
///
/// Stops after a `done` line, an in-band error or a transport error; the
/// latter two end the stream with a [`Fragment::Error`].
pub(crate) fn fragments_from_body<S, B, E>(body: S) -> impl Stream<Item = Fragment> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let state = BodyState {
        body,
        decoder: NdjsonDecoder::new(),
        queue: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.queue.pop_front() {
                return Some((fragment, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let chunks = state.decoder.push(bytes.as_ref());
                    state.enqueue(chunks);
                }
                Some(Err(e)) => {
                    state
                        .queue
                        .push_back(Fragment::error(format!("stream interrupted: {}", e)));
                    state.finished = true;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.enqueue(tail);
                    state.finished = true;
                }
            }
        }
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Ollama API Types (private)
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

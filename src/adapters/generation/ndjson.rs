//! Newline-delimited JSON decoding for `/api/generate` bodies.
//!
//! The backend emits one JSON object per line. Network chunks do not respect
//! line boundaries, so the decoder keeps the unterminated tail (raw bytes, to
//! survive split UTF-8 sequences) until the next chunk completes it.

use serde::Deserialize;
use tracing::warn;

use crate::ports::GenerationError;

/// One decoded line of backend output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    /// Set when the backend reports a failure in-band.
    #[serde(default)]
    pub error: Option<String>,
}

/// Incremental line decoder.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    pending: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns every chunk completed by them.
    ///
    /// Malformed lines are logged and dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<GenerateChunk> {
        self.pending.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(chunk) = decode_line(&line) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Decodes whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<GenerateChunk> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }

    /// Bytes held back waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<GenerateChunk> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<GenerateChunk>(line) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            warn!(error = %e, line_len = line.len(), "Dropping malformed generation line");
            None
        }
    }
}

/// Normalizes a buffered body into reply text.
///
/// Accepts either a single JSON object or NDJSON lines whose `response`
/// fields are concatenated in order.
pub fn decode_buffered(body: &str) -> Result<String, GenerationError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::parse("empty response body"));
    }

    if let Ok(chunk) = serde_json::from_str::<GenerateChunk>(trimmed) {
        return match chunk.error {
            Some(message) => Err(GenerationError::parse(message)),
            None => Ok(chunk.response),
        };
    }

    let mut text = String::new();
    let mut decoded_any = false;
    for line in trimmed.lines() {
        let Some(chunk) = decode_line(line.as_bytes()) else {
            continue;
        };
        if let Some(message) = chunk.error {
            return Err(GenerationError::parse(message));
        }
        decoded_any = true;
        text.push_str(&chunk.response);
        if chunk.done {
            break;
        }
    }

    if decoded_any {
        Ok(text)
    } else {
        Err(GenerationError::parse("no decodable lines in response body"))
    }
}

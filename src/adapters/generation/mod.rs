//! Text generation adapters.
//!
//! - `OllamaClient` - HTTP client for an Ollama-compatible backend
//! - `MockTextGenerator` - scripted replies for tests

mod mock_generator;
mod ndjson;
mod ollama_client;

pub use mock_generator::{MockError, MockReply, MockTextGenerator};
pub use ndjson::{decode_buffered, GenerateChunk, NdjsonDecoder};
pub use ollama_client::{OllamaClient, OllamaConfig, UNREACHABLE_MESSAGE};

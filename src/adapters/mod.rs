//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - bearer token validation
//! - `cache` - snapshot caches (in-memory, Redis)
//! - `generation` - Ollama client and scripted generator
//! - `http` - axum routes, auth middleware, SSE delivery
//! - `memory` - in-memory school records and snapshot sources
//! - `postgres` - read-only queries over the attendance schema

pub mod auth;
pub mod cache;
pub mod generation;
pub mod http;
pub mod memory;
pub mod postgres;

//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Generation base URL must be http(s): {0}")]
    InvalidGenerationUrl(String),

    #[error("Sampling parameter out of range: {0}")]
    InvalidSampling(&'static str),

    #[error("Retry policy needs at least one attempt")]
    InvalidRetryPolicy,

    #[error("Prompt budget too small (minimum {min} chars)")]
    PromptBudgetTooSmall { min: usize },

    #[error("Reply deadline ({deadline}s) must be shorter than the request timeout ({request}s)")]
    ReplyDeadlineTooLong { deadline: u64, request: u64 },

    #[error("JWT secret must be at least 32 bytes in production")]
    WeakJwtSecret,
}

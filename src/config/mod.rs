//! Application configuration module
//!
//! Configuration is loaded from environment variables using the `config` and
//! `dotenvy` crates. Variables carry the `ATTENDIFY` prefix and nested values
//! are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use attendify_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod assistant;
mod auth;
mod database;
mod error;
mod features;
mod generation;
mod redis;
mod server;

pub use assistant::{AssistantConfig, MIN_PROMPT_BUDGET};
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use generation::GenerationConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (optional snapshot cache)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Bearer token verification
    pub auth: AuthConfig,

    /// Generation backend
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Prompt and snapshot tuning
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `ATTENDIFY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ATTENDIFY__GENERATION__MODEL=llama3` -> `generation.model = llama3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ATTENDIFY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.generation.validate()?;
        self.assistant.validate()?;

        // Buffered replies must finish before the HTTP timeout cuts them off.
        if self.assistant.reply_deadline() >= self.server.request_timeout() {
            return Err(ValidationError::ReplyDeadlineTooLong {
                deadline: self.assistant.reply_deadline_secs,
                request: self.server.request_timeout_secs,
            });
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

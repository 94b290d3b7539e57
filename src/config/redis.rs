//! Redis configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Redis configuration for the snapshot cache
///
/// Redis is optional. Without a URL the process-local cache is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: Option<String>,

    /// Prefix prepended to every cache key
    #[serde(default)]
    pub key_prefix: String,
}

impl RedisConfig {
    /// Whether a Redis URL has been configured
    pub fn is_enabled(&self) -> bool {
        self.url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.url.as_deref() {
            None | Some("") => Ok(()),
            Some(url) if url.starts_with("redis://") || url.starts_with("rediss://") => Ok(()),
            Some(_) => Err(ValidationError::InvalidRedisUrl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let config = RedisConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_scheme() {
        let config = RedisConfig {
            url: Some("http://localhost:6379".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_url() {
        let config = RedisConfig {
            url: Some("redis://localhost:6379".to_string()),
            key_prefix: "attendify:".to_string(),
        };
        assert!(config.is_enabled());
        assert!(config.validate().is_ok());
    }
}

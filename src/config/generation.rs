//! Generation backend configuration (Ollama-compatible)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Generation backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Backend root URL, e.g. `http://localhost:11434`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name passed on every request
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Stop sequences (comma-separated)
    pub stop_sequences: Option<String>,

    /// Reachability probe connect timeout in milliseconds
    #[serde(default = "default_probe_connect_timeout")]
    pub probe_connect_timeout_ms: u64,

    /// Reachability probe overall timeout in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Connect timeout for generation calls in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overall timeout for a buffered generation call in seconds
    #[serde(default = "default_generate_timeout")]
    pub generate_timeout_secs: u64,

    /// Overall timeout for a streamed generation in seconds
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,

    /// Attempts for the buffered path, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff schedule in milliseconds (comma-separated)
    #[serde(default = "default_backoff")]
    pub backoff_ms: String,
}

impl GenerationConfig {
    pub fn probe_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_connect_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    /// Stop sequences as a vector
    pub fn stop_sequences_list(&self) -> Vec<String> {
        self.stop_sequences
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Delays to sleep between attempts. Unparseable entries are skipped.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.backoff_ms
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .collect()
    }

    /// Validate generation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGenerationUrl(self.base_url.clone()));
        }
        if self.model.is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__MODEL"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidSampling("temperature"));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ValidationError::InvalidSampling("top_p"));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        if self.probe_timeout_ms == 0 || self.generate_timeout_secs == 0 || self.stream_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            stop_sequences: None,
            probe_connect_timeout_ms: default_probe_connect_timeout(),
            probe_timeout_ms: default_probe_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            generate_timeout_secs: default_generate_timeout(),
            stream_timeout_secs: default_stream_timeout(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    256
}

fn default_probe_connect_timeout() -> u64 {
    2_000
}

fn default_probe_timeout() -> u64 {
    3_000
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_generate_timeout() -> u64 {
    55
}

fn default_stream_timeout() -> u64 {
    115
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> String {
    "200,500,1000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "qwen2.5:7b");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
        assert_eq!(config.stream_timeout(), Duration::from_secs(115));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_schedule_parsing() {
        let config = GenerationConfig {
            backoff_ms: "200, 500,oops,1000".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.backoff_schedule(),
            vec![
                Duration::from_millis(200),
                Duration::from_millis(500),
                Duration::from_millis(1000)
            ]
        );
    }

    #[test]
    fn test_stop_sequences_list() {
        let config = GenerationConfig {
            stop_sequences: Some("User:, ,###".to_string()),
            ..Default::default()
        };
        assert_eq!(config.stop_sequences_list(), vec!["User:", "###"]);
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let config = GenerationConfig {
            base_url: "localhost:11434".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidGenerationUrl(_))
        ));
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let config = GenerationConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRetryPolicy)
        ));
    }

    #[test]
    fn test_validation_rejects_out_of_range_top_p() {
        let config = GenerationConfig {
            top_p: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Chat service configuration.

use std::time::Duration;

use journal_local_ai::{SamplingParams, DEFAULT_HEALTH_INTERVAL, DEFAULT_MODEL, DEFAULT_PORT};

/// Configuration for the chat service.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model identifier passed to `llama-server -hf`
    pub model: String,
    /// Launch and monitor a local llama-server binary
    pub use_external_binary: bool,
    /// Port llama-server listens on
    pub port: u16,
    /// Time between health probes
    pub health_interval: Duration,
    /// Sampling settings for completions
    pub sampling: SamplingParams,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            use_external_binary: true,
            port: DEFAULT_PORT,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            sampling: SamplingParams::default(),
        }
    }
}

impl ChatConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model = std::env::var("JOURNAL_MODEL").unwrap_or(defaults.model);

        let use_external_binary = std::env::var("JOURNAL_USE_LOCAL_SERVER")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(defaults.use_external_binary);

        let port = std::env::var("JOURNAL_LLAMA_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let health_interval = std::env::var("JOURNAL_HEALTH_INTERVAL_MS")
            .ok()
            .and_then(|v| parse_interval_ms(&v))
            .unwrap_or(defaults.health_interval);

        Self {
            model,
            use_external_binary,
            port,
            health_interval,
            sampling: defaults.sampling,
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }
}

/// Milliseconds to a probe interval. Zero and junk are rejected.
fn parse_interval_ms(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// Builder for chat configuration.
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn use_external_binary(mut self, enabled: bool) -> Self {
        self.config.use_external_binary = enabled;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn health_interval(mut self, interval: Duration) -> Self {
        self.config.health_interval = interval;
        self
    }

    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.config.sampling = sampling;
        self
    }

    pub fn build(self) -> ChatConfig {
        self.config
    }
}

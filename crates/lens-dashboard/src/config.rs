//! Configuration for the dashboard pipeline

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on records returned by the freshness retriever
pub const DEFAULT_RETRIEVAL_CAP: usize = 10;

/// Configuration for the dashboard pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Model id for complex reasoning sections (strategy, financial deep dive)
    pub reasoning_model: String,

    /// Model id for fast extraction sections (summaries, JSON extraction)
    pub fast_model: String,

    /// Sampling temperature for insight generation
    pub temperature: f32,

    /// Maximum tokens per generated section
    pub max_tokens: usize,

    /// TTL for cached raw provider payloads within a session
    pub payload_cache_ttl: Duration,

    /// Cap on records returned by the freshness retriever
    pub retrieval_cap: usize,

    /// Request timeout for provider calls
    pub request_timeout: Duration,

    /// News search endpoint
    pub news_endpoint: String,

    /// Prediction-market search endpoint
    pub markets_endpoint: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reasoning_model: "gemini-1.5-pro".to_string(),
            fast_model: "gemini-2.0-flash".to_string(),
            temperature: 0.2, // low temp for factual analysis
            max_tokens: 2048,
            payload_cache_ttl: Duration::from_secs(300),
            retrieval_cap: DEFAULT_RETRIEVAL_CAP,
            request_timeout: Duration::from_secs(30),
            news_endpoint: "https://news-search.internal/api/v1/news".to_string(),
            markets_endpoint: "https://gamma-api.polymarket.com/markets".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.retrieval_cap == 0 {
            return Err(DashboardError::ConfigError(
                "retrieval_cap must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(DashboardError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.reasoning_model.is_empty() || self.fast_model.is_empty() {
            return Err(DashboardError::ConfigError(
                "model ids must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for DashboardConfig
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    reasoning_model: Option<String>,
    fast_model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    payload_cache_ttl: Option<Duration>,
    retrieval_cap: Option<usize>,
    request_timeout: Option<Duration>,
    news_endpoint: Option<String>,
    markets_endpoint: Option<String>,
}

impl DashboardConfigBuilder {
    /// Set the reasoning model id
    pub fn reasoning_model(mut self, model: impl Into<String>) -> Self {
        self.reasoning_model = Some(model.into());
        self
    }

    /// Set the fast model id
    pub fn fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens per section
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the payload cache TTL
    pub fn payload_cache_ttl(mut self, ttl: Duration) -> Self {
        self.payload_cache_ttl = Some(ttl);
        self
    }

    /// Set the retrieval cap
    pub fn retrieval_cap(mut self, cap: usize) -> Self {
        self.retrieval_cap = Some(cap);
        self
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the news search endpoint
    pub fn news_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.news_endpoint = Some(endpoint.into());
        self
    }

    /// Set the prediction-market search endpoint
    pub fn markets_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.markets_endpoint = Some(endpoint.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashboardConfig> {
        let defaults = DashboardConfig::default();

        let config = DashboardConfig {
            reasoning_model: self.reasoning_model.unwrap_or(defaults.reasoning_model),
            fast_model: self.fast_model.unwrap_or(defaults.fast_model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            payload_cache_ttl: self.payload_cache_ttl.unwrap_or(defaults.payload_cache_ttl),
            retrieval_cap: self.retrieval_cap.unwrap_or(defaults.retrieval_cap),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            news_endpoint: self.news_endpoint.unwrap_or(defaults.news_endpoint),
            markets_endpoint: self.markets_endpoint.unwrap_or(defaults.markets_endpoint),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.retrieval_cap, DEFAULT_RETRIEVAL_CAP);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = DashboardConfig::builder()
            .fast_model("gemini-1.5-flash")
            .retrieval_cap(5)
            .request_timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(config.fast_model, "gemini-1.5-flash");
        assert_eq!(config.retrieval_cap, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation_rejects_zero_cap() {
        let result = DashboardConfig::builder().retrieval_cap(0).build();
        assert!(result.is_err());
    }
}

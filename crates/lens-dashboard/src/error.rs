//! Error types for dashboard pipeline operations
//!
//! Two failure classes are deliberately NOT errors here: a metric
//! missing from a statement table degrades to a zero-filled series with
//! `present=false`, and an unparseable numeric coerces to `0.0`. Only
//! failures that a caller can scope to a section surface as `DashboardError`.

use thiserror::Error;

/// Dashboard pipeline errors
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Invalid ticker symbol provided
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Upstream provider call failed or timed out; scoped to one section
    #[error("Upstream unavailable ({source}): {reason}")]
    UpstreamUnavailable { r#source: String, reason: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Market data provider error
    #[error("Market data error: {0}")]
    MarketDataError(String),

    /// Text model call failed
    #[error("Model error: {0}")]
    ModelError(#[from] lens_llm::ModelError),

    /// Generated text failed formatting checks after the repair retry
    #[error("Model output violation: {0}")]
    OutputViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashboardError::InvalidTicker("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid ticker: INVALID");

        let err = DashboardError::UpstreamUnavailable {
            source: "news".to_string(),
            reason: "timed out".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream unavailable (news): timed out");
    }

    #[test]
    fn test_model_error_conversion() {
        let model_err = lens_llm::ModelError::AuthenticationFailed;
        let err: DashboardError = model_err.into();
        assert!(matches!(err, DashboardError::ModelError(_)));
    }
}

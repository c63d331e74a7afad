//! Error types shared by every stage of the advisory pipeline

use thiserror::Error;

/// Errors that can occur while resolving locations or fetching weather
#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// Missing or invalid provider credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The geocoding provider returned no candidate for the place name
    #[error("Location '{location}' not found")]
    NotFound { location: String },

    /// The provider answered with an unexpected or malformed response
    #[error("Unexpected provider response: {0}")]
    Upstream(String),

    /// Aggregation input was empty where a value is required
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Caller-supplied input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A value could not be rendered as JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

impl AdvisoryError {
    /// Create a not-found error for the given place name
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound {
            location: location.into(),
        }
    }

    /// Whether the message is safe to show to an end user verbatim
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidInput(_))
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, AdvisoryError>;

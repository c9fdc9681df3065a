// SPDX-License-Identifier: MIT

//! Typed error handling for agent-explorer-rs
//!
//! Each layer owns an error enum built with thiserror:
//! - `ModelError` - failures talking to the model service
//! - `ReviewError` - failures of the conditional retry evaluator
//! - `ExplorerError` - top-level error returned by agents and pipelines

use thiserror::Error;

/// Top-level error type for agent-explorer-rs
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Model service errors
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Retry evaluator errors
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Use case id not present in the registry
    #[error("Unknown use case: {0}")]
    UnknownUseCase(String),

    /// The model answered without any text
    #[error("Agent {0} received an empty response")]
    EmptyResponse(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Transport-level failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the provider
    #[error("API error from {provider} (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// The call did not complete within the per-call timeout
    #[error("Model call timed out after {0} ms")]
    Timeout(u64),
}

impl ModelError {
    /// Whether retrying the same call may succeed.
    ///
    /// Client-side 4xx errors and missing credentials are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::ApiKeyMissing(_) => false,
            ModelError::Api { status, .. } => *status >= 500,
            ModelError::Http(_)
            | ModelError::RateLimited { .. }
            | ModelError::InvalidResponse(_)
            | ModelError::Timeout(_) => true,
        }
    }
}

/// Conditional retry evaluator errors
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The model service could not be reached (after retrying transient failures)
    #[error("Model service unavailable after {attempts} tries: {source}")]
    ServiceUnavailable {
        attempts: u32,
        #[source]
        source: ModelError,
    },

    /// No fenced structured block in the response
    #[error("No ```json block found in model response")]
    Format,

    /// Block found but not valid per the verdict schema
    #[error("Failed to parse structured block: {message}\nBlock content was:\n{block}")]
    Parse { message: String, block: String },

    /// Attempt bound reached without a decision
    #[error("No decision after {attempts} attempts{}", .last_failure.as_ref().map(|f| format!(" (last failure: {})", f)).unwrap_or_default())]
    MaxRetriesExceeded {
        attempts: u32,
        last_failure: Option<String>,
    },

    /// Overall evaluation deadline elapsed
    #[error("Evaluation deadline of {0} ms exceeded")]
    DeadlineExceeded(u64),

    /// State machine misuse
    #[error("Invalid evaluation state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crate::explorer::review::Phase,
        to: crate::explorer::review::Phase,
    },
}

impl ReviewError {
    /// Stable snake_case label used by the HTTP API and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ReviewError::ServiceUnavailable { .. } => "service_unavailable",
            ReviewError::Format => "format_error",
            ReviewError::Parse { .. } => "parse_error",
            ReviewError::MaxRetriesExceeded { .. } => "max_retries_exceeded",
            ReviewError::DeadlineExceeded(_) => "deadline_exceeded",
            ReviewError::InvalidTransition { .. } => "invalid_transition",
        }
    }

    /// Malformed model output, as opposed to service or loop failures
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, ReviewError::Format | ReviewError::Parse { .. })
    }
}

impl ExplorerError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

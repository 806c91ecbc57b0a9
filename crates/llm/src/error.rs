use thiserror::Error;

/// Errors raised while talking to the reasoning service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenRouter API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("OpenRouter rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<u64> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Empty response from model {model}")]
    EmptyResponse { model: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl LlmError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api {
                status_code: Some(code),
                ..
            } => *code >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Result type alias for reasoning-service operations
pub type LlmResult<T> = Result<T, LlmError>;

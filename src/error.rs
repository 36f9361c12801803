use thiserror::Error;

/// Failures of an extraction call, from configuration through payload validation.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0} not configured")]
    Configuration(String),

    #[error("Rate limit exceeded, please try again later.")]
    RateLimited,

    #[error("Payment required, please add credits to your workspace.")]
    QuotaExceeded,

    #[error("AI gateway error ({status})")]
    Upstream { status: u16, body: String },

    #[error("completion transport failed: {0}")]
    Transport(String),

    #[error("No tool call in response")]
    NoStructuredPayload,

    #[error("malformed tool call payload: {0}")]
    MalformedPayload(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ExtractionError {
    /// HTTP status surfaced to callers of the extraction endpoints: 429, 402, otherwise 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ExtractionError::RateLimited => 429,
            ExtractionError::QuotaExceeded => 402,
            _ => 500,
        }
    }

    /// The caller's input was rejected before any completion was attempted.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, ExtractionError::InvalidRequest(_))
    }

    /// Whether resubmitting the same request later can succeed without outside action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractionError::RateLimited | ExtractionError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ExtractionError::RateLimited.status_code(), 429);
        assert_eq!(ExtractionError::QuotaExceeded.status_code(), 402);
        assert_eq!(
            ExtractionError::InvalidRequest("weights".to_string()).status_code(),
            500
        );
        assert!(ExtractionError::InvalidRequest("weights".to_string()).is_caller_error());
        assert!(!ExtractionError::RateLimited.is_caller_error());
        assert_eq!(
            ExtractionError::Upstream {
                status: 503,
                body: String::new()
            }
            .status_code(),
            500
        );
        assert_eq!(ExtractionError::NoStructuredPayload.status_code(), 500);
        assert_eq!(
            ExtractionError::Configuration("AI_GATEWAY_API_KEY".to_string()).status_code(),
            500
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ExtractionError::RateLimited.is_retryable());
        assert!(ExtractionError::Transport("reset".to_string()).is_retryable());
        assert!(!ExtractionError::QuotaExceeded.is_retryable());
        assert!(!ExtractionError::MalformedPayload("x".to_string()).is_retryable());
    }

    #[test]
    fn test_messages() {
        assert!(ExtractionError::RateLimited
            .to_string()
            .starts_with("Rate limit exceeded"));
        assert!(ExtractionError::QuotaExceeded
            .to_string()
            .starts_with("Payment required"));
        assert_eq!(
            ExtractionError::Configuration("AI_GATEWAY_API_KEY".to_string()).to_string(),
            "AI_GATEWAY_API_KEY not configured"
        );
    }
}

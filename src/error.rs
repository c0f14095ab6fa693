// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Completion service rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Unexpected response shape: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Webhook delivery failed: {0}")]
    Webhook(String),
}

impl PipelineError {
    /// Rate limits get the long backoff; everything else is treated as transient.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, PipelineError::RateLimited(_))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}

impl From<quick_xml::Error> for PipelineError {
    fn from(err: quick_xml::Error) -> Self {
        PipelineError::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(PipelineError::RateLimited("quota".to_string()).is_rate_limit());
        assert!(!PipelineError::Parse("bad".to_string()).is_rate_limit());
        assert!(
            !PipelineError::Api {
                service: "esearch",
                status: 500,
                body: String::new(),
            }
            .is_rate_limit()
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = PipelineError::Api {
            service: "completions",
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "completions returned HTTP 503: unavailable");
    }
}

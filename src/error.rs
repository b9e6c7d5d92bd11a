//! Error taxonomy for the comparison service
//!
//! The engine surfaces a typed result to its caller and never retries on its
//! own; retry policy belongs to whoever issued the request.

use thiserror::Error;

/// Errors produced by the comparison engine, the stores and the daily summary
#[derive(Error, Debug)]
pub enum CompareError {
    /// No runs were recorded for the requested refs and workload
    #[error("no benchmark runs found: {0}")]
    NotFound(String),

    /// Too few runs to perform a valid significance test
    #[error("insufficient samples: need at least {needed} runs per side, got old={old} new={new}")]
    InsufficientSamples {
        needed: usize,
        old: usize,
        new: usize,
    },

    /// The upstream results API is unreachable, timed out or failed
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Caller supplied a malformed ref, workload or configuration value
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A dataset or upstream payload did not match the expected schema
    #[error("failed to decode payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompareError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        CompareError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        CompareError::InvalidInput(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        CompareError::UpstreamUnavailable(msg.into())
    }
}

/// Result type for comparison operations
pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_samples_message() {
        let err = CompareError::InsufficientSamples {
            needed: 2,
            old: 1,
            new: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient samples: need at least 2 runs per side, got old=1 new=5"
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err: CompareError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, CompareError::Parse(_)));
    }
}

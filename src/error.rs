//! Error taxonomy for usage acquisition.
//!
//! Only `NoCredential` and `NoDataAvailable` ever leave [`crate::usage::fetch_usage`].
//! Transport and decode failures from the API client trigger the stale-cache
//! fallback, and the cache variants never escape the cache implementations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    /// Every credential source was tried and none produced a token
    #[error("no OAuth token found in any credential source")]
    NoCredential,

    /// The API failed and there is no cached snapshot for this key
    #[error("usage API failed and no cached data is available")]
    NoDataAvailable,

    /// Connection, TLS or read failure
    #[error("usage request failed: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("usage request timed out")]
    Timeout,

    /// Non-200 response
    #[error("usage API returned status {0}")]
    HttpStatus(u16),

    /// Body was not a valid usage document (includes truncated bodies)
    #[error("malformed usage response: {0}")]
    Parse(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("corrupt cache entry: {0}")]
    CacheCorrupt(String),
}

impl UsageError {
    /// Failures of the remote fetch itself, all handled by the stale fallback
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            UsageError::Network(_)
                | UsageError::Timeout
                | UsageError::HttpStatus(_)
                | UsageError::Parse(_)
        )
    }
}

// src/error.rs

//! Unified error handling for the ratio crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request could not be sent
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A page could not be reached: timeout, connection failure or non-2xx status
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Illegal crawl job lifecycle transition
    #[error("Job error: {0}")]
    Job(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a job lifecycle error.
    pub fn job(message: impl Into<String>) -> Self {
        Self::Job(message.into())
    }

    /// Whether this error means the page could not be reached.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// A single table row could not be decoded.
///
/// Recovered inside the table parser: the row is skipped and parsing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowParseError {
    #[error("row has {len} cells, column {index} is missing")]
    MissingCell { index: usize, len: usize },

    #[error("invalid rowspan value '{0}'")]
    InvalidSpan(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = AppError::fetch("https://example.com/Ratio1.html", "HTTP 404");
        assert!(err.is_fetch());
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.com/Ratio1.html: HTTP 404"
        );
    }

    #[test]
    fn test_non_fetch_errors() {
        assert!(!AppError::config("bad").is_fetch());
        assert!(!AppError::job("bad").is_fetch());
    }
}

//! Error types for pagewalk
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for pagewalk
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    // ============================================================================
    // Paging Errors
    // ============================================================================
    /// Fetching a page failed. `continuation_token` is the token that was in
    /// effect for the failed attempt; `None` means the initial request.
    #[error("Failed to fetch page (continuation token: {}): {source}", display_token(.continuation_token))]
    Fetch {
        continuation_token: Option<String>,
        #[source]
        source: Box<Error>,
    },

    /// The response was fetched but could not be turned into a page.
    #[error("Failed to extract page (continuation token: {}): {source}", display_token(.continuation_token))]
    Extract {
        continuation_token: Option<String>,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid continuation token '{token}': {message}")]
    InvalidContinuation { token: String, message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

fn display_token(token: &Option<String>) -> &str {
    token.as_deref().unwrap_or("<initial>")
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid continuation error
    pub fn invalid_continuation(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidContinuation {
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Wrap a failed fetch with the token it was attempted with
    pub fn fetch(continuation_token: Option<String>, source: Error) -> Self {
        Self::Fetch {
            continuation_token,
            source: Box::new(source),
        }
    }

    /// Wrap a failed extraction with the token its response was fetched with
    pub fn extract(continuation_token: Option<String>, source: Error) -> Self {
        Self::Extract {
            continuation_token,
            source: Box::new(source),
        }
    }

    /// Token to resume from after a paging failure.
    ///
    /// Returns `None` for errors that carry no resumption context, and also for
    /// failures of the initial request (resume by starting over).
    pub fn continuation_token(&self) -> Option<&str> {
        match self {
            Error::Fetch {
                continuation_token, ..
            }
            | Error::Extract {
                continuation_token, ..
            } => continuation_token.as_deref(),
            _ => None,
        }
    }

    /// Check if this is a paging failure that can be resumed
    pub fn is_resumable(&self) -> bool {
        matches!(self, Error::Fetch { .. } | Error::Extract { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            Error::Fetch { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for pagewalk
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}

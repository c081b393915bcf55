//! Error types for the quickstart servers
//!
//! This module defines the domain errors raised by discovery, the login
//! flow and the platform proxies, using `thiserror` for ergonomic error
//! handling. The HTTP layer maps them to status codes in
//! [`crate::server::error`].

use thiserror::Error;

/// Main error type for quickstart operations
///
/// Library functions return [`Result`] (an `anyhow::Result`) and wrap one of
/// these variants so that callers can downcast to pick a response status.
#[derive(Error, Debug)]
pub enum QuickstartError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// OpenID Connect discovery failed or returned an unusable document
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Authorization errors (token exchange, userinfo, state handling)
    #[error("Authorization error: {0}")]
    Auth(String),

    /// An upstream service could not be reached
    #[error("{service} request failed: {message}")]
    Upstream {
        /// Name of the upstream API (e.g. `"search"`)
        service: &'static str,
        /// Transport error text
        message: String,
    },

    /// An upstream service did not answer within the configured timeout
    #[error("{service} request timed out: {message}")]
    UpstreamTimeout {
        /// Name of the upstream API
        service: &'static str,
        /// Transport error text
        message: String,
    },

    /// An upstream service answered with a non-success status
    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamStatus {
        /// Name of the upstream API
        service: &'static str,
        /// HTTP status code returned upstream
        status: u16,
        /// Response body returned upstream
        body: String,
    },

    /// An upstream response could not be decoded or lacks required fields
    #[error("Malformed {service} response: {message}")]
    MalformedResponse {
        /// Name of the upstream API
        service: &'static str,
        /// What was wrong with the payload
        message: String,
    },

    /// A required query parameter was absent from the incoming request
    #[error("missing {0} parameter")]
    MissingParameter(&'static str),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl QuickstartError {
    /// Classifies a `reqwest` transport error for the named upstream service.
    ///
    /// Timeouts become [`QuickstartError::UpstreamTimeout`]; everything else
    /// becomes [`QuickstartError::Upstream`].
    pub fn transport(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout {
                service,
                message: err.to_string(),
            }
        } else {
            Self::Upstream {
                service,
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for quickstart operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

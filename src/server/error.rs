//! Mapping of errors to HTTP responses
//!
//! Handlers return `Result<_, ApiError>`. Any `anyhow::Error` converts into an
//! [`ApiError`] by downcasting to [`QuickstartError`]: missing parameters are
//! the caller's fault (400), upstream timeouts are 504, other upstream
//! failures are 502 and everything else is 500. The body is the error text as
//! `text/plain`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::QuickstartError;

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Error with an explicit status and body.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with `message` as body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 500 with `message` as body.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Status the response will carry
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body the response will carry
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<QuickstartError>() {
        Some(QuickstartError::MissingParameter(_)) => StatusCode::BAD_REQUEST,
        Some(QuickstartError::UpstreamTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        Some(QuickstartError::Upstream { .. })
        | Some(QuickstartError::UpstreamStatus { .. })
        | Some(QuickstartError::MalformedResponse { .. }) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %err, "Request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<QuickstartError> for ApiError {
    fn from(err: QuickstartError) -> Self {
        anyhow::Error::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

//! Error types for Canvas operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composite::CreatedPage;

/// Result type for Canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Credentials could not be resolved, so no request can be authenticated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The base URL and/or the token is unset or empty after every source was checked.
    #[error(
        "Canvas credentials are not configured (missing {missing}). Set CANVAS_API_URL and \
         CANVAS_API_TOKEN, or create a .env file containing both keys in the project root, \
         your home directory or the current working directory"
    )]
    Missing {
        /// Names of the keys that are still unset.
        missing: String,
    },

    /// A configuration file exists but could not be parsed.
    #[error("failed to read configuration file {}: {message}", .path.display())]
    File {
        /// The offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// `CANVAS_API_URL` is not an absolute http(s) URL.
    #[error("invalid CANVAS_API_URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors that can occur while talking to Canvas.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Credentials are missing or unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Caller supplied malformed or insufficient arguments. No request was sent.
    #[error("invalid arguments: {0}")]
    Validation(String),

    /// Canvas could not be reached (DNS, connect, timeout, reset).
    #[error("request to {path} failed: {source}")]
    Transport {
        /// API path of the failed request.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// Canvas answered with a non-success status.
    #[error("Canvas API error ({status}) on {path}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Canvas messages joined into one line.
        message: String,
        /// Individual Canvas messages, when the body carried any.
        errors: Vec<String>,
        /// API path of the failed request.
        path: String,
    },

    /// Canvas answered with success but the body was not what the endpoint promises.
    #[error("unexpected Canvas response from {path}: {message}")]
    UnexpectedResponse {
        /// API path of the request.
        path: String,
        /// What was wrong.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Cancelled while a request was in flight; Canvas may or may not have applied it.
    #[error("cancelled while the request to {path} was in flight; its outcome is unknown")]
    Interrupted {
        /// API path of the abandoned request.
        path: String,
    },

    /// A composite operation created a page, then a later step failed.
    #[error("{operation}: page {completed} was created but the next step failed: {cause}")]
    PartialFailure {
        /// Name of the composite operation.
        operation: &'static str,
        /// What was created before the failure.
        completed: Box<CreatedPage>,
        /// The failing step's error.
        cause: Box<CanvasError>,
    },
}

/// Coarse classification of a [`CanvasError`], stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`CanvasError::Configuration`].
    ConfigurationError,
    /// See [`CanvasError::Validation`].
    ValidationError,
    /// See [`CanvasError::Transport`].
    TransportError,
    /// See [`CanvasError::Api`].
    ApiError,
    /// See [`CanvasError::UnexpectedResponse`].
    UnexpectedResponse,
    /// See [`CanvasError::Cancelled`].
    Cancelled,
    /// See [`CanvasError::PartialFailure`].
    PartialFailure,
}

impl ErrorKind {
    /// Snake-case name, as it appears on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::ValidationError => "validation_error",
            Self::TransportError => "transport_error",
            Self::ApiError => "api_error",
            Self::UnexpectedResponse => "unexpected_response",
            Self::Cancelled => "cancelled",
            Self::PartialFailure => "partial_failure",
        }
    }
}

impl CanvasError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The bare message, without the variant prefix `Display` adds.
    pub(crate) fn into_message(self) -> String {
        match self {
            Self::Validation(message) => message,
            other => other.to_string(),
        }
    }

    pub(crate) fn unexpected(path: impl ToString, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::Api { .. } => ErrorKind::ApiError,
            Self::UnexpectedResponse { .. } => ErrorKind::UnexpectedResponse,
            Self::Cancelled | Self::Interrupted { .. } => ErrorKind::Cancelled,
            Self::PartialFailure { .. } => ErrorKind::PartialFailure,
        }
    }

    /// Returns true if retrying the same call may succeed (network-level failures only).
    ///
    /// Nothing in this crate retries; the flag is advice for the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status for API errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// API path of the request that failed, when one was sent.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Transport { path, .. }
            | Self::Api { path, .. }
            | Self::UnexpectedResponse { path, .. }
            | Self::Interrupted { path } => Some(path),
            _ => None,
        }
    }

    /// True if the transport error was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

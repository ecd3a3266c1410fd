//! Error types for the studio client.
//!
//! Every failure the client layer can produce is a variant of [`Error`]. The
//! variants line up with what a caller has to tell the user:
//! - missing or unusable credentials
//! - an unreadable local file
//! - a request the remote service rejected
//! - a successful call that produced nothing usable
//! - structured output that failed to parse
//! - a failed artifact download or an operation that never finished

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the studio client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No usable credential could be resolved, or the client configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A local file could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Read {
        /// The file that was being read.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The remote service rejected the request.
    #[error("generation request rejected{}: {message}", rejection_label(*status, *code))]
    GenerationRequest {
        /// HTTP status of a rejected call.
        status: Option<u16>,
        /// Status code of a long-running operation that finished with an error.
        code: Option<i32>,
        /// Provider message.
        message: String,
    },

    /// The call succeeded but produced no usable content.
    #[error("no {what} was produced, please retry{}", reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResult {
        /// The kind of artifact that was expected (e.g. "image").
        what: &'static str,
        /// A block or finish reason reported by the service, if any.
        reason: Option<String>,
    },

    /// Structured output failed to parse or validate.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The generated artifact could not be downloaded.
    #[error("failed to download generated artifact: {0}")]
    ArtifactFetch(String),

    /// A long-running operation did not finish within the polling policy.
    #[error("operation {name} still pending after {attempts} status checks ({:.0}s)", elapsed.as_secs_f64())]
    PollTimeout {
        /// The provider-issued operation name.
        name: String,
        /// Number of status fetches performed.
        attempts: u32,
        /// Wall-clock time spent polling.
        elapsed: Duration,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse error categories, for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// See [`Error::Configuration`].
    Configuration,
    /// See [`Error::Read`].
    Read,
    /// See [`Error::GenerationRequest`].
    GenerationRequest,
    /// See [`Error::EmptyResult`].
    EmptyResult,
    /// See [`Error::MalformedResponse`].
    MalformedResponse,
    /// See [`Error::ArtifactFetch`].
    ArtifactFetch,
    /// See [`Error::PollTimeout`].
    PollTimeout,
    /// See [`Error::Http`].
    Network,
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a read error for the given path.
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a request-rejected error.
    #[must_use]
    pub fn request(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::GenerationRequest {
            status,
            code: None,
            message: msg.into(),
        }
    }

    /// Create a request-rejected error for an operation that finished with
    /// an error status.
    #[must_use]
    pub fn operation_failed(code: Option<i32>, msg: impl Into<String>) -> Self {
        Self::GenerationRequest {
            status: None,
            code,
            message: msg.into(),
        }
    }

    /// Create an empty-result error.
    #[must_use]
    pub const fn empty(what: &'static str, reason: Option<String>) -> Self {
        Self::EmptyResult { what, reason }
    }

    /// Create a malformed-response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an artifact download error.
    #[must_use]
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::ArtifactFetch(msg.into())
    }

    /// The category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Read { .. } => ErrorKind::Read,
            Self::GenerationRequest { .. } => ErrorKind::GenerationRequest,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::ArtifactFetch(_) => ErrorKind::ArtifactFetch,
            Self::PollTimeout { .. } => ErrorKind::PollTimeout,
            Self::Http(_) => ErrorKind::Network,
        }
    }
}

fn rejection_label(status: Option<u16>, code: Option<i32>) -> String {
    match (status, code) {
        (Some(status), _) => format!(" (HTTP {status})"),
        (None, Some(code)) => format!(" (code {code})"),
        (None, None) => String::new(),
    }
}

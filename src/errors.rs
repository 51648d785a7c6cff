//! Error types used across the crate

use core::time::Duration;

use thiserror::Error;

/// Raised when a source cannot be created at all. Nothing is retried after one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("event source url cannot be empty")]
    EmptyUrl,
    #[error("invalid event source configuration: {message}")]
    InvalidConfig { message: String },
}

impl OpenError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Recoverable failure of a single poll, delivered as [`SourceEvent::Error`][crate::event::SourceEvent::Error].
/// The source keeps polling after every one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The server closed a record without data and without moving the last event id forward
    #[error("connection went stale: boundary without new data")]
    Stale,
    /// The server answered with a non-success status
    #[error("unexpected response status {0}")]
    Status(u16),
    /// The request outlived the configured request timeout and was aborted
    #[error("request aborted after {0:?}")]
    Timeout(Duration),
    /// Something went wrong with the underlying transport
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body was not valid utf8
    #[error("response body is not valid utf8")]
    Utf8,
}

impl SourceError {
    pub(crate) fn transport(err: impl core::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Whether the error came from the stale connection check rather than the transport
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }
}

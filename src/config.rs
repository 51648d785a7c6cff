//! Polling source configuration.

use core::time::Duration;

use bytes_utils::Str;

use crate::{
    constants::{DEFAULT_INTERVAL, DEFAULT_REQUEST_TIMEOUT},
    errors::OpenError,
};

/// Configuration for a polling event source.
///
/// The defaults match what browsers without native event stream support have been served for years: poll every
/// 500ms and give up on a request after 10s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between the end of one request and the start of the next, until the server sends `retry`.
    pub interval: Duration,
    /// Delay before the very first request.
    pub first_poll_delay: Duration,
    /// Every request is aborted once it has been running this long.
    pub request_timeout: Duration,
    /// Sent along with every request on top of the event stream headers.
    pub headers: Vec<(Str, Str)>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            first_poll_delay: DEFAULT_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            headers: Vec::new(),
        }
    }
}

impl PollingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial polling interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the delay before the first request, zero polls right away.
    #[must_use]
    pub fn first_poll_delay(mut self, delay: Duration) -> Self {
        self.first_poll_delay = delay;
        self
    }

    /// Set the per request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Add a header to every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<Str>, value: impl Into<Str>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError::InvalidConfig`] if any field has an invalid value.
    pub fn validate(&self) -> Result<(), OpenError> {
        if self.request_timeout.is_zero() {
            return Err(OpenError::config("request timeout must be > 0"));
        }
        if self.headers.iter().any(|(name, _)| name.is_empty()) {
            return Err(OpenError::config("header names cannot be empty"));
        }
        Ok(())
    }
}

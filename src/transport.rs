//! The HTTP side of a polling source
//!
//! A [`Transport`] issues one GET per poll and hands back the status plus the body as a stream of appended chunks.
//! Dropping the response future or the body aborts the request.

use core::{fmt::Display, future::Future};

use bytes::Bytes;
use bytes_utils::Str;
use futures_core::Stream;

use crate::constants::{
    ACCEPT, CACHE_CONTROL, EVENT_STREAM, LAST_EVENT_ID, NO_CACHE, X_REQUESTED_WITH,
    XML_HTTP_REQUEST,
};

/// A single poll, always a GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub url: Str,
    pub headers: Vec<(Str, Str)>,
}

impl PollRequest {
    /// Builds the request for one poll cycle. `Last-Event-ID` is only sent when there is an id to resume from.
    pub fn new(url: Str, last_event_id: Option<&Str>, extra_headers: &[(Str, Str)]) -> Self {
        let mut headers = vec![
            (ACCEPT, EVENT_STREAM),
            (CACHE_CONTROL, NO_CACHE),
            // some clients only report progress before the connection closes when this is set
            (X_REQUESTED_WITH, XML_HTTP_REQUEST),
        ];
        headers.extend(extra_headers.iter().cloned());

        if let Some(id) = last_event_id {
            headers.push((LAST_EVENT_ID, id.clone()));
        }

        Self { url, headers }
    }

    /// Case insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&Str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Response to a [`PollRequest`], the body streams whatever arrives on top of what came before
#[derive(Debug)]
pub struct PollResponse<B> {
    pub status: u16,
    pub body: B,
}

impl<B> PollResponse<B> {
    pub fn new(status: u16, body: B) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues the requests of a polling source
pub trait Transport {
    type Error: Display;
    type Body: Stream<Item = Result<Bytes, Self::Error>>;
    type Response: Future<Output = Result<PollResponse<Self::Body>, Self::Error>>;

    fn send(&self, request: PollRequest) -> Self::Response;
}
